/// The append-only spreadsheet ledger.
///
/// Two tabs: a daily summary ("GDD") and a raw observation log ("Raw").
/// Both are created once and only ever appended to, never rewritten or
/// compacted. This module defines the abstract row store the rest of the
/// crate talks to, the row encodings (including the not-a-number
/// serialization policy), and the resume-point locator.
///
/// Submodules:
/// - `sheets` - Google Sheets v4 backend.
/// - `memory` - in-memory backend for tests and offline runs.

pub mod memory;
pub mod sheets;

use std::error::Error;

use chrono::{Days, NaiveDate};

use crate::model::{DailySummary, GddError, Observation, LEDGER_DATE_FORMAT};

// ---------------------------------------------------------------------------
// Sheet layout
// ---------------------------------------------------------------------------

/// Tab holding one row per processed calendar day.
pub const SUMMARY_SHEET: &str = "GDD";

/// Tab accumulating every fetched observation.
pub const RAW_SHEET: &str = "Raw";

/// Row indices are 1-based; row 1 is the header.
pub const FIRST_DATA_ROW: usize = 2;

/// Sentinel written for any absent or non-finite value. One policy for the
/// whole ledger: a persisted cell is never an unparsable blank.
pub const NAN_CELL: &str = "nan";

pub const SUMMARY_HEADER: [&str; 4] = ["Date", "AVG Temp", "GDD", "CGDD"];

/// Raw-log columns, in persistence order. The station-local timestamp leads;
/// the remaining columns mirror the upstream payload.
pub const RAW_HEADER: [&str; 31] = [
    "datetime_local",
    "dateutc",
    "tempf",
    "humidity",
    "windspeedmph",
    "windgustmph",
    "maxdailygust",
    "winddir",
    "winddir_avg10m",
    "uv",
    "solarradiation",
    "hourlyrainin",
    "eventrainin",
    "dailyrainin",
    "weeklyrainin",
    "monthlyrainin",
    "yearlyrainin",
    "battout",
    "tempinf",
    "humidityin",
    "baromrelin",
    "baromabsin",
    "battin",
    "feelsLike",
    "dewPoint",
    "feelsLikein",
    "dewPointin",
    "passkey",
    "time",
    "loc",
    "date",
];

// ---------------------------------------------------------------------------
// Row store interface
// ---------------------------------------------------------------------------

/// An ordered tabular store addressed by 1-based row index.
///
/// The production implementation is `sheets::SheetsClient`; aggregation
/// logic depends only on this trait, so the backend can be swapped without
/// touching it.
pub trait RowStore {
    /// Create the named sheet if missing and write its header row if empty.
    fn ensure_sheet(&mut self, sheet: &str, header: &[&str]) -> Result<(), Box<dyn Error>>;

    /// Read one row. `Ok(None)` past the end of the populated range.
    fn read_row(&mut self, sheet: &str, index: usize)
    -> Result<Option<Vec<String>>, Box<dyn Error>>;

    /// Read every populated row, header included.
    fn read_all_rows(&mut self, sheet: &str) -> Result<Vec<Vec<String>>, Box<dyn Error>>;

    /// Append rows after the last populated row.
    fn append_rows(&mut self, sheet: &str, rows: Vec<Vec<String>>) -> Result<(), Box<dyn Error>>;

    /// Write one row at a fixed index.
    fn update_row(
        &mut self,
        sheet: &str,
        index: usize,
        fields: Vec<String>,
    ) -> Result<(), Box<dyn Error>>;
}

/// Create both ledger tabs and their headers if this spreadsheet has never
/// been written before.
pub fn ensure_sheet_structure(store: &mut dyn RowStore) -> Result<(), Box<dyn Error>> {
    store.ensure_sheet(SUMMARY_SHEET, &SUMMARY_HEADER)?;
    store.ensure_sheet(RAW_SHEET, &RAW_HEADER)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Cell encoding
// ---------------------------------------------------------------------------

/// Encode an optional metric. Absent and non-finite values both collapse to
/// the `"nan"` sentinel; finite numbers use their shortest decimal form.
pub fn numeric_cell(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => NAN_CELL.to_string(),
    }
}

/// Encode an optional integer field (epoch timestamps).
pub fn integer_cell(value: Option<i64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => NAN_CELL.to_string(),
    }
}

/// Encode an optional text field. Present values pass through unaltered.
pub fn text_cell(value: Option<&str>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => NAN_CELL.to_string(),
    }
}

/// One raw-log row for a fetched observation, in `RAW_HEADER` order.
pub fn raw_row(obs: &Observation) -> Result<Vec<String>, GddError> {
    Ok(vec![
        obs.local_timestamp()?,
        obs.dateutc.to_string(),
        numeric_cell(obs.tempf),
        numeric_cell(obs.humidity),
        numeric_cell(obs.windspeedmph),
        numeric_cell(obs.windgustmph),
        numeric_cell(obs.maxdailygust),
        numeric_cell(obs.winddir),
        numeric_cell(obs.winddir_avg10m),
        numeric_cell(obs.uv),
        numeric_cell(obs.solarradiation),
        numeric_cell(obs.hourlyrainin),
        numeric_cell(obs.eventrainin),
        numeric_cell(obs.dailyrainin),
        numeric_cell(obs.weeklyrainin),
        numeric_cell(obs.monthlyrainin),
        numeric_cell(obs.yearlyrainin),
        numeric_cell(obs.battout),
        numeric_cell(obs.tempinf),
        numeric_cell(obs.humidityin),
        numeric_cell(obs.baromrelin),
        numeric_cell(obs.baromabsin),
        numeric_cell(obs.battin),
        numeric_cell(obs.feels_like),
        numeric_cell(obs.dew_point),
        numeric_cell(obs.feels_like_in),
        numeric_cell(obs.dew_point_in),
        text_cell(obs.passkey.as_deref()),
        integer_cell(obs.time),
        text_cell(obs.loc.as_deref()),
        text_cell(obs.date.as_deref()),
    ])
}

/// One summary-ledger row, numerics rounded to the ledger's two decimals.
pub fn summary_row(summary: &DailySummary) -> Vec<String> {
    vec![
        summary.date.format(LEDGER_DATE_FORMAT).to_string(),
        format!("{:.2}", summary.mean_temp),
        format!("{:.2}", summary.gdd),
        format!("{:.2}", summary.cumulative_gdd),
    ]
}

// ---------------------------------------------------------------------------
// Resume-point locator
// ---------------------------------------------------------------------------

/// Where a run picks up: the first date with no summary row, the cumulative
/// GDD carried from the last populated row, and the 1-based index the next
/// summary row will occupy.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumePoint {
    pub start_date: NaiveDate,
    pub cumulative_gdd: f64,
    pub next_row_index: usize,
}

/// Scan the summary ledger forward and locate the resume point.
///
/// Each populated data row advances the candidate start to its date plus one
/// day; the scan stops at the first empty row. The configured default start
/// wins only when it is later than the candidate. A populated row with an
/// unparsable date or cumulative value fails the run; downstream cumulative
/// math depends on ledger contiguity, so nothing is silently skipped.
pub fn find_resume_point(
    store: &mut dyn RowStore,
    default_start: NaiveDate,
) -> Result<ResumePoint, Box<dyn Error>> {
    let rows = store.read_all_rows(SUMMARY_SHEET)?;

    let mut candidate: Option<NaiveDate> = None;
    let mut cumulative_gdd = 0.0;
    let mut next_row_index = FIRST_DATA_ROW;

    for (i, row) in rows.iter().enumerate().skip(FIRST_DATA_ROW - 1) {
        let row_index = i + 1;
        if is_blank_row(row) {
            break;
        }

        let date_field = row.first().map(String::as_str).unwrap_or("");
        let date = NaiveDate::parse_from_str(date_field.trim(), LEDGER_DATE_FORMAT).map_err(
            |_| GddError::BadLedgerDate {
                row: row_index,
                value: date_field.to_string(),
            },
        )?;

        let cgdd_field = row.get(3).map(String::as_str).unwrap_or("");
        cumulative_gdd =
            cgdd_field
                .trim()
                .parse::<f64>()
                .map_err(|_| GddError::BadLedgerNumber {
                    row: row_index,
                    value: cgdd_field.to_string(),
                })?;

        candidate = date.checked_add_days(Days::new(1));
        next_row_index = row_index + 1;
    }

    let start_date = match candidate {
        Some(next) if next > default_start => next,
        _ => default_start,
    };

    Ok(ResumePoint {
        start_date,
        cumulative_gdd,
        next_row_index,
    })
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded_store(summary_rows: &[[&str; 4]]) -> MemoryStore {
        let mut store = MemoryStore::new();
        ensure_sheet_structure(&mut store).unwrap();
        for row in summary_rows {
            let index = {
                let existing = store.read_all_rows(SUMMARY_SHEET).unwrap();
                existing.len() + 1
            };
            store
                .update_row(
                    SUMMARY_SHEET,
                    index,
                    row.iter().map(|s| s.to_string()).collect(),
                )
                .unwrap();
        }
        store
    }

    // --- Cell encoding ------------------------------------------------------

    #[test]
    fn test_absent_numeric_becomes_nan_sentinel() {
        assert_eq!(numeric_cell(None), "nan");
    }

    #[test]
    fn test_non_finite_numeric_becomes_nan_sentinel() {
        assert_eq!(numeric_cell(Some(f64::NAN)), "nan");
        assert_eq!(numeric_cell(Some(f64::INFINITY)), "nan");
        assert_eq!(numeric_cell(Some(f64::NEG_INFINITY)), "nan");
    }

    #[test]
    fn test_finite_values_pass_through_unaltered() {
        assert_eq!(numeric_cell(Some(31.3)), "31.3");
        assert_eq!(numeric_cell(Some(0.0)), "0");
        assert_eq!(numeric_cell(Some(-4.25)), "-4.25");
        assert_eq!(integer_cell(Some(1769623500000)), "1769623500000");
        assert_eq!(text_cell(Some("outdoor")), "outdoor");
    }

    #[test]
    fn test_raw_row_matches_header_order() {
        let obs: Observation = serde_json::from_str(
            r#"{"dateutc": 1769623500000, "tempf": 31.3, "humidity": 58.0}"#,
        )
        .unwrap();
        let row = raw_row(&obs).unwrap();

        assert_eq!(row.len(), RAW_HEADER.len());
        assert_eq!(row[0], "2026-01-28 12:05:00 -0600");
        assert_eq!(row[1], "1769623500000");
        assert_eq!(row[2], "31.3");
        assert_eq!(row[3], "58");
        // Everything the payload omitted is the sentinel, not a blank.
        assert!(row[4..].iter().all(|cell| cell == "nan"));
    }

    #[test]
    fn test_summary_row_rounds_to_two_decimals() {
        let summary = DailySummary {
            date: date(2026, 1, 28),
            mean_temp: 62.37,
            gdd: 12.37,
            cumulative_gdd: 57.466,
        };
        assert_eq!(
            summary_row(&summary),
            vec!["01/28/2026", "62.37", "12.37", "57.47"]
        );
    }

    // --- Resume-point locator -----------------------------------------------

    #[test]
    fn test_empty_ledger_resumes_at_default_start() {
        let mut store = seeded_store(&[]);
        let resume = find_resume_point(&mut store, date(2026, 1, 1)).unwrap();
        assert_eq!(
            resume,
            ResumePoint {
                start_date: date(2026, 1, 1),
                cumulative_gdd: 0.0,
                next_row_index: FIRST_DATA_ROW,
            }
        );
    }

    #[test]
    fn test_unstructured_ledger_resumes_at_default_start() {
        // A spreadsheet with no rows at all (not even a header).
        let mut store = MemoryStore::new();
        let resume = find_resume_point(&mut store, date(2026, 3, 5)).unwrap();
        assert_eq!(resume.start_date, date(2026, 3, 5));
        assert_eq!(resume.next_row_index, FIRST_DATA_ROW);
    }

    #[test]
    fn test_resume_is_last_row_date_plus_one() {
        let mut store = seeded_store(&[
            ["02/08/2026", "54.00", "4.00", "4.00"],
            ["02/09/2026", "48.00", "0.00", "4.00"],
            ["02/10/2026", "61.50", "11.50", "15.50"],
        ]);
        let resume = find_resume_point(&mut store, date(2026, 1, 1)).unwrap();
        assert_eq!(resume.start_date, date(2026, 2, 11));
        assert_eq!(resume.cumulative_gdd, 15.50);
        assert_eq!(resume.next_row_index, 5);
    }

    #[test]
    fn test_later_default_start_wins_over_candidate() {
        let mut store = seeded_store(&[["02/10/2026", "61.50", "11.50", "15.50"]]);
        let resume = find_resume_point(&mut store, date(2026, 6, 1)).unwrap();
        // The cumulative still carries across the gap; it never resets.
        assert_eq!(resume.start_date, date(2026, 6, 1));
        assert_eq!(resume.cumulative_gdd, 15.50);
    }

    #[test]
    fn test_unparsable_ledger_date_fails_the_run() {
        let mut store = seeded_store(&[
            ["02/10/2026", "61.50", "11.50", "15.50"],
            ["not-a-date", "61.50", "11.50", "27.00"],
        ]);
        let err = find_resume_point(&mut store, date(2026, 1, 1)).unwrap_err();
        assert!(
            err.to_string().contains("not-a-date"),
            "error should name the bad cell, got: {}",
            err
        );
        assert!(
            err.to_string().contains("row 3"),
            "error should name the offending row, got: {}",
            err
        );
    }

    #[test]
    fn test_unparsable_cumulative_fails_the_run() {
        let mut store = seeded_store(&[["02/10/2026", "61.50", "11.50", "#REF!"]]);
        let err = find_resume_point(&mut store, date(2026, 1, 1)).unwrap_err();
        assert!(
            err.to_string().contains("#REF!"),
            "error should name the bad cell, got: {}",
            err
        );
    }

    #[test]
    fn test_scan_stops_at_first_blank_row() {
        let mut store = seeded_store(&[["02/10/2026", "61.50", "11.50", "15.50"]]);
        // A stray value far below the populated range must not extend the scan.
        store
            .update_row(SUMMARY_SHEET, 10, vec!["junk".to_string()])
            .unwrap();
        let resume = find_resume_point(&mut store, date(2026, 1, 1)).unwrap();
        assert_eq!(resume.start_date, date(2026, 2, 11));
        assert_eq!(resume.next_row_index, 3);
    }
}
