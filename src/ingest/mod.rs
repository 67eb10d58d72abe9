/// Telemetry ingestion.
///
/// Submodules:
/// - `ambient` - Ambient Weather REST API client.

pub mod ambient;

use std::error::Error;

use crate::model::Observation;

/// The upstream observation feed, as the aggregator sees it.
///
/// One operation: fetch the day of samples ending at the given UTC
/// epoch-millisecond cutoff. The upstream decides which samples precede the
/// cutoff; callers trust it to return exactly one day's worth and do not
/// re-validate the range of what comes back.
pub trait ObservationSource {
    fn fetch_observations(&self, end_of_day_ms: i64) -> Result<Vec<Observation>, Box<dyn Error>>;
}
