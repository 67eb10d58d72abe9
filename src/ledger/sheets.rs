/// Google Sheets Data API Client
///
/// Implements `RowStore` over the Sheets v4 values API. The spreadsheet is
/// addressed by its document ID; authentication is an OAuth bearer token
/// minted outside this process (service-account plumbing is infrastructure,
/// not part of this service).
///
/// API Documentation: https://developers.google.com/sheets/api/reference/rest

use std::error::Error;

use serde::Deserialize;

use crate::model::GddError;

use super::RowStore;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Widest column the ledger uses (the raw log has 31 columns, A..AE).
const LAST_COLUMN: &str = "AE";

// ============================================================================
// Sheets API Response Structures
// ============================================================================

/// Response body of a `values/{range}` GET. Google omits `values` entirely
/// for an empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

// ============================================================================
// Client
// ============================================================================

pub struct SheetsClient {
    http: reqwest::blocking::Client,
    base_url: String,
    spreadsheet_id: String,
    token: String,
}

impl SheetsClient {
    pub fn new(http: reqwest::blocking::Client, spreadsheet_id: &str, token: &str) -> Self {
        SheetsClient {
            http,
            base_url: SHEETS_BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            token: token.to_string(),
        }
    }

    /// Point the client at a non-default endpoint (local API emulators).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn values_url(&self, range: &str) -> String {
        format!("{}/{}/values/{}", self.base_url, self.spreadsheet_id, range)
    }

    fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
        let response = self
            .http
            .get(self.values_url(range))
            .bearer_auth(&self.token)
            .send()?;

        if !response.status().is_success() {
            return Err(Box::new(GddError::HttpError(response.status().as_u16())));
        }

        let body: ValueRange = response.json()?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.iter().map(cell_string).collect())
            .collect())
    }

    /// Titles of the tabs this spreadsheet currently contains.
    fn sheet_titles(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let url = format!(
            "{}/{}?fields=sheets.properties.title",
            self.base_url, self.spreadsheet_id
        );
        let response = self.http.get(url).bearer_auth(&self.token).send()?;

        if !response.status().is_success() {
            return Err(Box::new(GddError::HttpError(response.status().as_u16())));
        }

        let json: serde_json::Value = response.json()?;
        let titles = json
            .get("sheets")
            .and_then(|s| s.as_array())
            .map(|sheets| {
                sheets
                    .iter()
                    .filter_map(|sheet| {
                        sheet
                            .get("properties")
                            .and_then(|p| p.get("title"))
                            .and_then(|t| t.as_str())
                            .map(String::from)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(titles)
    }

    fn add_sheet(&self, title: &str) -> Result<(), Box<dyn Error>> {
        let url = format!("{}/{}:batchUpdate", self.base_url, self.spreadsheet_id);
        let body = serde_json::json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            return Err(Box::new(GddError::HttpError(response.status().as_u16())));
        }

        Ok(())
    }
}

/// Flatten a JSON cell to its spreadsheet string form. Cells arrive as
/// strings unless the sheet has typed them; `null` reads as an empty cell.
fn cell_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// RowStore implementation
// ============================================================================

impl RowStore for SheetsClient {
    fn ensure_sheet(&mut self, sheet: &str, header: &[&str]) -> Result<(), Box<dyn Error>> {
        if !self.sheet_titles()?.iter().any(|title| title == sheet) {
            self.add_sheet(sheet)?;
        }

        let header_missing = match self.read_row(sheet, 1)? {
            None => true,
            Some(row) => row.iter().all(|cell| cell.trim().is_empty()),
        };
        if header_missing {
            let fields: Vec<String> = header.iter().map(|s| s.to_string()).collect();
            self.update_row(sheet, 1, fields)?;
        }

        Ok(())
    }

    fn read_row(
        &mut self,
        sheet: &str,
        index: usize,
    ) -> Result<Option<Vec<String>>, Box<dyn Error>> {
        if index == 0 {
            return Ok(None);
        }
        let range = format!("{}!A{}:{}{}", sheet, index, LAST_COLUMN, index);
        Ok(self.get_values(&range)?.into_iter().next())
    }

    fn read_all_rows(&mut self, sheet: &str) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
        let range = format!("{}!A:{}", sheet, LAST_COLUMN);
        self.get_values(&range)
    }

    fn append_rows(&mut self, sheet: &str, rows: Vec<Vec<String>>) -> Result<(), Box<dyn Error>> {
        if rows.is_empty() {
            return Ok(());
        }

        let url = format!(
            "{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.values_url(&format!("{}!A1", sheet))
        );
        let body = serde_json::json!({ "values": rows });

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            return Err(Box::new(GddError::HttpError(response.status().as_u16())));
        }

        Ok(())
    }

    fn update_row(
        &mut self,
        sheet: &str,
        index: usize,
        fields: Vec<String>,
    ) -> Result<(), Box<dyn Error>> {
        let url = format!(
            "{}?valueInputOption=USER_ENTERED",
            self.values_url(&format!("{}!A{}", sheet, index))
        );
        let body = serde_json::json!({ "values": [fields] });

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            return Err(Box::new(GddError::HttpError(response.status().as_u16())));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
