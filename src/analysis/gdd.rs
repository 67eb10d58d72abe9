/// Growing-degree-day computation.
///
/// A growing degree day measures heat accumulation above a crop-specific
/// base temperature: `gdd = max(mean_temp - base_temp, 0)`, summed day over
/// day into a cumulative total that never decreases and never resets.

use chrono::NaiveDate;

use crate::model::{GddError, Observation};

/// Arithmetic mean of the outdoor temperature across one day's observations.
///
/// Observations without a temperature reading are skipped. A day with no
/// observations at all, or none carrying a temperature, is an error; a
/// silent NaN here would poison every later cumulative value.
pub fn mean_temperature(date: NaiveDate, observations: &[Observation]) -> Result<f64, GddError> {
    if observations.is_empty() {
        return Err(GddError::NoObservations(date));
    }

    let temps: Vec<f64> = observations.iter().filter_map(|obs| obs.tempf).collect();
    if temps.is_empty() {
        return Err(GddError::NoTemperature(date));
    }

    Ok(temps.iter().sum::<f64>() / temps.len() as f64)
}

/// Degree days accumulated on a single day: `max(mean - base, 0)`.
///
/// Never negative: a day colder than the base contributes exactly zero.
pub fn daily_gdd(mean_temp: f64, base_temp: f64) -> f64 {
    (mean_temp - base_temp).max(0.0)
}

/// Round to two decimals, the precision the ledger stores.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One accumulation step: the previous cumulative total plus today's
/// (already rounded) GDD, re-rounded so the in-run running value is
/// bit-identical to what a resumed run would parse back off the ledger.
pub fn accumulate(previous_cumulative: f64, gdd: f64) -> f64 {
    round2(previous_cumulative + gdd)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn obs_with_temp(tempf: Option<f64>) -> Observation {
        let mut obs: Observation =
            serde_json::from_str("{\"dateutc\": 1769623500000}").expect("minimal payload");
        obs.tempf = tempf;
        obs
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 28).unwrap()
    }

    #[test]
    fn test_mean_temperature_averages_all_samples() {
        let observations = vec![
            obs_with_temp(Some(30.0)),
            obs_with_temp(Some(40.0)),
            obs_with_temp(Some(50.0)),
        ];
        assert_eq!(mean_temperature(day(), &observations).unwrap(), 40.0);
    }

    #[test]
    fn test_mean_temperature_skips_missing_readings() {
        // A sensor dropout mid-day must not drag the mean toward zero.
        let observations = vec![
            obs_with_temp(Some(30.0)),
            obs_with_temp(None),
            obs_with_temp(Some(50.0)),
        ];
        assert_eq!(mean_temperature(day(), &observations).unwrap(), 40.0);
    }

    #[test]
    fn test_empty_day_is_fatal() {
        let result = mean_temperature(day(), &[]);
        assert_eq!(result, Err(GddError::NoObservations(day())));
    }

    #[test]
    fn test_day_with_no_temperatures_is_fatal() {
        let observations = vec![obs_with_temp(None), obs_with_temp(None)];
        let result = mean_temperature(day(), &observations);
        assert_eq!(result, Err(GddError::NoTemperature(day())));
    }

    #[test]
    fn test_gdd_above_base() {
        // base 50.0, mean 62.37 -> 12.37 exactly after rounding.
        assert_eq!(round2(daily_gdd(62.37, 50.0)), 12.37);
    }

    #[test]
    fn test_gdd_is_never_negative() {
        assert_eq!(daily_gdd(41.5, 50.0), 0.0);
        assert_eq!(daily_gdd(50.0, 50.0), 0.0);
    }

    #[test]
    fn test_cold_day_leaves_cumulative_unchanged() {
        // Previous cumulative 45.10, mean below base -> cumulative unchanged.
        let gdd = round2(daily_gdd(38.0, 50.0));
        assert_eq!(accumulate(45.10, gdd), 45.10);
    }

    #[test]
    fn test_accumulate_rounds_to_ledger_precision() {
        assert_eq!(accumulate(45.10, 12.37), 57.47);
        // 0.1 + 0.2 style float residue must not leak into the ledger.
        assert_eq!(accumulate(0.1, 0.2), 0.3);
    }
}
