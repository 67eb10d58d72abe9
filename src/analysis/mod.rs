/// Aggregation math for the GDD ledger updater.
///
/// Pure computation only, no I/O. The day loop in `backfill` feeds fetched
/// observations through these helpers and persists the results.
///
/// Submodules:
/// - `gdd` - mean temperature, growing-degree-day, and accumulation helpers.

pub mod gdd;
