/// In-memory row store.
///
/// Backs the test suite and offline development runs when no live
/// spreadsheet is available. Semantics mirror the Sheets backend: 1-based
/// row indices, `ensure_sheet` writes the header only into an empty sheet,
/// and updates past the populated range grow the sheet with blank rows.

use std::collections::BTreeMap;
use std::error::Error;

use super::RowStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: BTreeMap<String, Vec<Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Direct access to a sheet's rows, for test assertions.
    pub fn rows(&self, sheet: &str) -> &[Vec<String>] {
        self.sheets.get(sheet).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl RowStore for MemoryStore {
    fn ensure_sheet(&mut self, sheet: &str, header: &[&str]) -> Result<(), Box<dyn Error>> {
        let rows = self.sheets.entry(sheet.to_string()).or_default();
        let header_missing = match rows.first() {
            None => true,
            Some(first) => first.iter().all(|cell| cell.trim().is_empty()),
        };
        if header_missing {
            let header_row: Vec<String> = header.iter().map(|s| s.to_string()).collect();
            if rows.is_empty() {
                rows.push(header_row);
            } else {
                rows[0] = header_row;
            }
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
        Ok(self
            .sheets
            .get(sheet)
            .and_then(|rows| rows.get(index - 1))
            .cloned())
    }

    fn read_all_rows(&mut self, sheet: &str) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
        Ok(self.sheets.get(sheet).cloned().unwrap_or_default())
    }

    fn append_rows(&mut self, sheet: &str, rows: Vec<Vec<String>>) -> Result<(), Box<dyn Error>> {
        self.sheets.entry(sheet.to_string()).or_default().extend(rows);
        Ok(())
    }

    fn update_row(
        &mut self,
        sheet: &str,
        index: usize,
        fields: Vec<String>,
    ) -> Result<(), Box<dyn Error>> {
        if index == 0 {
            return Err("row indices are 1-based".into());
        }
        let rows = self.sheets.entry(sheet.to_string()).or_default();
        while rows.len() < index {
            rows.push(Vec::new());
        }
        rows[index - 1] = fields;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
