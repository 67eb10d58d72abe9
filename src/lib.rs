/// GDD ledger updater.
///
/// Polls a personal weather station's history API for each missing calendar
/// day, computes the day's growing-degree-day accumulation, and appends the
/// results to a spreadsheet-backed ledger. One sequential pass per run; the
/// ledger itself is the checkpoint that lets the next run resume where this
/// one stopped.

pub mod analysis;
pub mod backfill;
pub mod config;
pub mod ingest;
pub mod ledger;
pub mod logging;
pub mod model;
