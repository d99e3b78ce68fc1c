use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SheetsError;

/// Moderation status as written in the sheet's status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusValue {
    None,
    FirstDelivery,
    Warning,
    BanPoint,
}

impl StatusValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::FirstDelivery => "FIRST_DELIVERY",
            Self::Warning => "WARNING",
            Self::BanPoint => "BAN_POINT",
        }
    }

    /// Anything other than `NONE` needs a review.
    pub fn is_danger(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusValue {
    type Err = SheetsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "NONE" => Ok(Self::None),
            "FIRST_DELIVERY" => Ok(Self::FirstDelivery),
            "WARNING" => Ok(Self::Warning),
            "BAN_POINT" => Ok(Self::BanPoint),
            other => Err(SheetsError::Parse(format!("unknown status value: {other:?}"))),
        }
    }
}

/// One row of the status sheet.
///
/// `row_index` is the row's position within the fetched range, not a stable key.
/// It is only valid as a write address while the sheet keeps the same row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub row_index: usize,
    pub nickname: String,
    pub user_id: i64,
    pub status: StatusValue,
    pub updated_at: String,
}

/// Body of a values GET. `values` is omitted entirely for an empty range.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

/// Body of a values PUT.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ValueUpdate {
    pub values: Vec<Vec<String>>,
}
