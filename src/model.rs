/// Core data types for the GDD ledger updater.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O and no aggregation logic: only types, the station
/// time zone, and the crate error enum.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Station constants
// ---------------------------------------------------------------------------

/// Time zone used for all station-local timestamps and day boundaries.
///
/// Hardcoded rather than derived from device configuration; the station
/// does not move.
pub const STATION_TZ: Tz = chrono_tz::America::Chicago;

/// Format used for the `datetime_local` column of the raw log.
pub const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Format used for the `Date` column of the summary ledger and for the
/// configured default start date.
pub const LEDGER_DATE_FORMAT: &str = "%m/%d/%Y";

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// A single telemetry sample from the Ambient Weather device-history API.
///
/// Field names mirror the wire format; metrics the station does not report
/// are simply absent from the payload, so every metric is `Option<f64>`.
/// Only `dateutc` (UTC epoch milliseconds) is guaranteed present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Observation {
    pub dateutc: i64,
    pub tempf: Option<f64>,
    pub humidity: Option<f64>,
    pub windspeedmph: Option<f64>,
    pub windgustmph: Option<f64>,
    pub maxdailygust: Option<f64>,
    pub winddir: Option<f64>,
    pub winddir_avg10m: Option<f64>,
    pub uv: Option<f64>,
    pub solarradiation: Option<f64>,
    pub hourlyrainin: Option<f64>,
    pub eventrainin: Option<f64>,
    pub dailyrainin: Option<f64>,
    pub weeklyrainin: Option<f64>,
    pub monthlyrainin: Option<f64>,
    pub yearlyrainin: Option<f64>,
    pub battout: Option<f64>,
    pub tempinf: Option<f64>,
    pub humidityin: Option<f64>,
    pub baromrelin: Option<f64>,
    pub baromabsin: Option<f64>,
    pub battin: Option<f64>,
    #[serde(rename = "feelsLike")]
    pub feels_like: Option<f64>,
    #[serde(rename = "dewPoint")]
    pub dew_point: Option<f64>,
    #[serde(rename = "feelsLikein")]
    pub feels_like_in: Option<f64>,
    #[serde(rename = "dewPointin")]
    pub dew_point_in: Option<f64>,
    pub passkey: Option<String>,
    pub time: Option<i64>,
    pub loc: Option<String>,
    pub date: Option<String>,
}

impl Observation {
    /// Station-local rendering of `dateutc`, e.g. "2026-01-28 12:05:00 -0600".
    ///
    /// This becomes the first column of the raw log. Returns an error if the
    /// millisecond timestamp is outside chrono's representable range.
    pub fn local_timestamp(&self) -> Result<String, GddError> {
        let utc: DateTime<Utc> = Utc
            .timestamp_millis_opt(self.dateutc)
            .single()
            .ok_or(GddError::BadTimestamp(self.dateutc))?;
        Ok(utc
            .with_timezone(&STATION_TZ)
            .format(LOCAL_TIMESTAMP_FORMAT)
            .to_string())
    }
}

// ---------------------------------------------------------------------------
// Daily summary
// ---------------------------------------------------------------------------

/// One computed row of the summary ledger.
///
/// `gdd = max(mean_temp - base_temp, 0)`; `cumulative_gdd` is the running
/// total from the first tracked day. Values are rounded to two decimals at
/// the persistence boundary, and the rounded cumulative is what carries
/// forward into the next day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub mean_temp: f64,
    pub gdd: f64,
    pub cumulative_gdd: f64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while configuring, fetching, or updating the ledger.
///
/// Every variant is fatal: the run terminates on the first error and relies
/// on the append-only ledger plus a rerun for recovery.
#[derive(Debug, PartialEq)]
pub enum GddError {
    /// A required environment variable is absent.
    MissingConfig(String),
    /// An environment variable is present but unusable.
    InvalidConfig { name: String, value: String },
    /// Non-2xx HTTP response from an external API.
    HttpError(u16),
    /// A response body could not be deserialized.
    ParseError(String),
    /// The Ambient Weather account has no devices.
    NoDevices,
    /// The upstream returned zero observations for a day.
    NoObservations(NaiveDate),
    /// Observations exist for a day but none carries a temperature.
    NoTemperature(NaiveDate),
    /// A summary-ledger row holds an unparsable date.
    BadLedgerDate { row: usize, value: String },
    /// A summary-ledger row holds an unparsable cumulative value.
    BadLedgerNumber { row: usize, value: String },
    /// An observation timestamp is outside the representable range.
    BadTimestamp(i64),
}

impl std::fmt::Display for GddError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GddError::MissingConfig(name) => {
                write!(f, "Missing required environment variable: {}", name)
            }
            GddError::InvalidConfig { name, value } => {
                write!(f, "Invalid value for {}: {:?}", name, value)
            }
            GddError::HttpError(code) => write!(f, "HTTP error: {}", code),
            GddError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            GddError::NoDevices => write!(f, "No devices registered for this API key"),
            GddError::NoObservations(date) => {
                write!(f, "No observations returned for {}", date)
            }
            GddError::NoTemperature(date) => {
                write!(f, "No temperature readings among observations for {}", date)
            }
            GddError::BadLedgerDate { row, value } => {
                write!(f, "Unparsable date {:?} in ledger row {}", value, row)
            }
            GddError::BadLedgerNumber { row, value } => {
                write!(f, "Unparsable cumulative GDD {:?} in ledger row {}", value, row)
            }
            GddError::BadTimestamp(ms) => {
                write!(f, "Observation timestamp out of range: {} ms", ms)
            }
        }
    }
}

impl std::error::Error for GddError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
