//! A1-notation handling for the status range and per-row write addresses.

use std::fmt;
use std::str::FromStr;

use crate::error::SheetsError;

/// Offset of the status column from the first column of the range.
const STATUS_COLUMN_OFFSET: u32 = 2;
/// Offset of the updated-at column; always right after status.
const DATE_COLUMN_OFFSET: u32 = 3;

/// The configured read range, e.g. `Status!A2:D`.
///
/// Only the sheet name and the top-left cell matter for addressing; the rest of
/// the range is passed through to the API untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    raw: String,
    sheet: Option<String>,
    first_column: u32,
    first_row: u32,
}

impl SheetRange {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Sheet row number (1-based) for a row at `row_index` in the fetched range.
    pub fn sheet_row(&self, row_index: usize) -> u32 {
        self.first_row + row_index as u32
    }

    /// Range covering just the status and updated-at cells of one row.
    pub fn status_cells(&self, row_index: usize) -> String {
        let row = self.sheet_row(row_index);
        let status_col = column_letters(self.first_column + STATUS_COLUMN_OFFSET);
        let date_col = column_letters(self.first_column + DATE_COLUMN_OFFSET);
        match &self.sheet {
            Some(sheet) => format!("{sheet}!{status_col}{row}:{date_col}{row}"),
            None => format!("{status_col}{row}:{date_col}{row}"),
        }
    }
}

impl FromStr for SheetRange {
    type Err = SheetsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(SheetsError::Parse("empty sheet range".into()));
        }

        let (sheet, cells) = match raw.rfind('!') {
            Some(pos) => (Some(raw[..pos].to_string()), &raw[pos + 1..]),
            None if raw.contains(':') => (None, raw),
            // A bare sheet name means the whole sheet, starting at A1.
            None => (Some(raw.to_string()), "A1"),
        };

        let start = cells.split(':').next().unwrap_or_default();
        let letters: String = start.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        let digits = &start[letters.len()..];

        let first_column = if letters.is_empty() {
            0
        } else {
            column_index(&letters)
                // the status and date cells sit to the right of the first column
                .filter(|c| c.checked_add(DATE_COLUMN_OFFSET).is_some())
                .ok_or_else(|| SheetsError::Parse(format!("bad column in range {raw:?}")))?
        };
        let first_row = if digits.is_empty() {
            1
        } else {
            digits
                .parse::<u32>()
                .ok()
                .filter(|r| *r >= 1)
                .ok_or_else(|| SheetsError::Parse(format!("bad row in range {raw:?}")))?
        };

        Ok(Self {
            raw: raw.to_string(),
            sheet,
            first_column,
            first_row,
        })
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// `A` -> 0, `Z` -> 25, `AA` -> 26.
fn column_index(letters: &str) -> Option<u32> {
    letters
        .chars()
        .try_fold(0u32, |acc, c| {
            let c = c.to_ascii_uppercase();
            if !c.is_ascii_uppercase() {
                return None;
            }
            acc.checked_mul(26)?.checked_add(c as u32 - 'A' as u32 + 1)
        })
        .map(|n| n - 1)
}

/// Inverse of `column_index`.
fn column_letters(mut index: u32) -> String {
    let mut out = Vec::new();
    loop {
        out.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    out.iter().rev().collect()
}
