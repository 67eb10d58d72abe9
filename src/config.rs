/// Run configuration, loaded from the environment.
///
/// A `.env` file is honored when present (dotenv), matching how the service
/// is deployed alongside its credentials. Every value without a default is
/// required; a missing or malformed value fails the run at startup, before
/// any external call is made.

use chrono::NaiveDate;

use crate::model::{GddError, LEDGER_DATE_FORMAT};

/// Default Ambient Weather REST endpoint.
pub const DEFAULT_AMBIENT_ENDPOINT: &str = "https://rt.ambientweather.net/v1";

/// Everything a run needs, resolved once in `main` and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ambient Weather API base URL.
    pub ambient_endpoint: String,
    /// Ambient Weather account API key.
    pub ambient_api_key: String,
    /// Ambient Weather application key.
    pub ambient_application_key: String,
    /// Google Sheets spreadsheet identifier holding both ledger tabs.
    pub spreadsheet_id: String,
    /// OAuth bearer token for the Sheets API, minted by infrastructure.
    pub sheets_token: String,
    /// Earliest date the ledger should ever contain (month/day/year).
    pub default_start: NaiveDate,
    /// GDD base temperature threshold, in the station's native unit.
    pub base_temp: f64,
    /// Optional log file; console-only logging when unset.
    pub log_file: Option<String>,
}

impl Config {
    /// Read and validate the environment.
    pub fn from_env() -> Result<Config, GddError> {
        let default_start = parse_start_date("GDD_START_DATE", &required("GDD_START_DATE")?)?;
        let base_temp_raw = required("GDD_BASE_TEMP")?;
        let base_temp = base_temp_raw
            .trim()
            .parse::<f64>()
            .map_err(|_| GddError::InvalidConfig {
                name: "GDD_BASE_TEMP".to_string(),
                value: base_temp_raw.clone(),
            })?;
        if !base_temp.is_finite() {
            return Err(GddError::InvalidConfig {
                name: "GDD_BASE_TEMP".to_string(),
                value: base_temp_raw,
            });
        }

        Ok(Config {
            ambient_endpoint: std::env::var("AMBIENT_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_AMBIENT_ENDPOINT.to_string()),
            ambient_api_key: required("AMBIENT_API_KEY")?,
            ambient_application_key: required("AMBIENT_APPLICATION_KEY")?,
            spreadsheet_id: required("GDD_SPREADSHEET_ID")?,
            sheets_token: required("SHEETS_ACCESS_TOKEN")?,
            default_start,
            base_temp,
            log_file: std::env::var("GDD_LOG_FILE").ok(),
        })
    }
}

fn required(name: &str) -> Result<String, GddError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(GddError::MissingConfig(name.to_string())),
    }
}

/// Parse a month/day/year date like "3/14/2025".
pub fn parse_start_date(name: &str, value: &str) -> Result<NaiveDate, GddError> {
    NaiveDate::parse_from_str(value.trim(), LEDGER_DATE_FORMAT).map_err(|_| {
        GddError::InvalidConfig {
            name: name.to_string(),
            value: value.to_string(),
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
