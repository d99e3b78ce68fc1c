pub mod auth;
pub mod error;
pub mod range;
pub mod types;

pub use auth::{
    ServiceAccountKey, ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider,
    SPREADSHEETS_SCOPE,
};
pub use error::{Result, SheetsError};
pub use range::SheetRange;
pub use types::{StatusRow, StatusValue};

use std::sync::Arc;

use reqwest::Url;
use types::{ValueRange, ValueUpdate};

const BASE_URL: &str = "https://sheets.googleapis.com";

/// Columns a status row must have: nickname, user id, status, updated at.
const STATUS_COLUMNS: usize = 4;

/// The moderation status sheet.
///
/// Reads the whole configured range and writes single-row status resets back
/// to it. Writes are unconditional: a row edited between read and write is
/// overwritten.
pub struct SheetsStatusStore {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    range: SheetRange,
    tokens: Arc<dyn TokenProvider>,
}

impl SheetsStatusStore {
    pub fn new(spreadsheet_id: &str, range: SheetRange, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            range,
            tokens,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetsError::Parse(format!("invalid base url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Parse(format!("base url cannot hold a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    /// Every row in the configured range, in sheet order.
    pub async fn fetch_status_rows(&self) -> Result<Vec<StatusRow>> {
        let url = self.values_url(self.range.as_str())?;
        let token = self.tokens.valid_token().await?;

        let resp = self.client.get(url).bearer_auth(token).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: ValueRange = resp.json().await?;
        body.values
            .iter()
            .enumerate()
            .map(|(row_index, cells)| parse_status_row(row_index, cells))
            .collect()
    }

    /// Rows whose status is anything other than `NONE`.
    pub async fn fetch_danger_rows(&self) -> Result<Vec<StatusRow>> {
        let rows = self.fetch_status_rows().await?;
        let total = rows.len();
        let danger: Vec<StatusRow> = rows.into_iter().filter(|r| r.status.is_danger()).collect();
        tracing::info!(total, danger = danger.len(), range = %self.range, "Fetched status rows");
        Ok(danger)
    }

    /// Set the row at `row_index` back to `NONE`, stamped with today's local date.
    pub async fn reset_status(&self, row_index: usize) -> Result<()> {
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        let target = self.range.status_cells(row_index);

        let mut url = self.values_url(&target)?;
        // USER_ENTERED makes the sheet parse the date instead of storing raw text.
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        let body = ValueUpdate {
            values: vec![vec![StatusValue::None.to_string(), today]],
        };
        let token = self.tokens.valid_token().await?;

        let resp = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(row_index, range = %target, "Reset status to NONE");
        Ok(())
    }
}

fn parse_status_row(row_index: usize, cells: &[String]) -> Result<StatusRow> {
    if cells.len() < STATUS_COLUMNS {
        return Err(SheetsError::Parse(format!(
            "row {row_index}: expected {STATUS_COLUMNS} columns, got {}",
            cells.len()
        )));
    }

    let user_id = cells[1].trim().parse().map_err(|_| {
        SheetsError::Parse(format!(
            "row {row_index}: user id is not an integer: {:?}",
            cells[1]
        ))
    })?;
    let status = cells[2].parse::<StatusValue>().map_err(|_| {
        SheetsError::Parse(format!("row {row_index}: unknown status {:?}", cells[2]))
    })?;

    Ok(StatusRow {
        row_index,
        nickname: cells[0].clone(),
        user_id,
        status,
        updated_at: cells[3].clone(),
    })
}
