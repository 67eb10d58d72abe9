/// Ambient Weather REST API Client
///
/// Retrieves historical telemetry from a personal weather station through
/// the Ambient Weather cloud API. The account is expected to own a single
/// station; the first registered device is used.
///
/// API Documentation: https://ambientweather.docs.apiary.io/

use std::error::Error;

use serde::Deserialize;

use crate::model::{GddError, Observation};

use super::ObservationSource;

/// Samples requested per day query. Stations report on a 5-minute cadence,
/// so a full day is 288 samples.
const DAY_SAMPLE_LIMIT: u32 = 288;

// ============================================================================
// Ambient API Response Structures
// ============================================================================

/// One entry of the `/devices` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    #[serde(rename = "macAddress")]
    pub mac_address: String,
    pub info: Option<DeviceInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceInfo {
    pub name: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

pub struct AmbientClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    application_key: String,
    device_mac: String,
    device_name: Option<String>,
}

impl AmbientClient {
    /// List the account's devices and bind the client to the first one.
    ///
    /// An account with no devices is fatal; there is nothing to poll.
    pub fn discover(
        http: reqwest::blocking::Client,
        endpoint: &str,
        api_key: &str,
        application_key: &str,
    ) -> Result<AmbientClient, Box<dyn Error>> {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        let url = devices_url(&endpoint, api_key, application_key);

        let response = http.get(&url).send()?;
        if !response.status().is_success() {
            return Err(Box::new(GddError::HttpError(response.status().as_u16())));
        }

        let devices: Vec<Device> = response.json()?;
        let device = devices.into_iter().next().ok_or(GddError::NoDevices)?;

        Ok(AmbientClient {
            http,
            endpoint,
            api_key: api_key.to_string(),
            application_key: application_key.to_string(),
            device_name: device.info.and_then(|info| info.name),
            device_mac: device.mac_address,
        })
    }

    pub fn device_mac(&self) -> &str {
        &self.device_mac
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }
}

impl ObservationSource for AmbientClient {
    /// Fetch one day of samples ending at the cutoff, newest first.
    fn fetch_observations(&self, end_of_day_ms: i64) -> Result<Vec<Observation>, Box<dyn Error>> {
        let url = device_history_url(
            &self.endpoint,
            &self.device_mac,
            &self.api_key,
            &self.application_key,
            end_of_day_ms,
        );

        let response = self.http.get(&url).send()?;
        if !response.status().is_success() {
            return Err(Box::new(GddError::HttpError(response.status().as_u16())));
        }

        let observations: Vec<Observation> = response.json()?;
        Ok(observations)
    }
}

// ============================================================================
// URL construction
// ============================================================================

fn devices_url(endpoint: &str, api_key: &str, application_key: &str) -> String {
    format!(
        "{}/devices?apiKey={}&applicationKey={}",
        endpoint, api_key, application_key
    )
}

fn device_history_url(
    endpoint: &str,
    mac: &str,
    api_key: &str,
    application_key: &str,
    end_date_ms: i64,
) -> String {
    format!(
        "{}/devices/{}?apiKey={}&applicationKey={}&endDate={}&limit={}",
        endpoint, mac, api_key, application_key, end_date_ms, DAY_SAMPLE_LIMIT
    )
}

// ============================================================================
// Tests
// ============================================================================
