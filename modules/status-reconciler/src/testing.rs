// Test doubles for the reconciliation pass.
//
// - MockStatusStore (StatusStore): in-memory sheet; resets really flip rows to NONE
// - MockReviewSource (ReviewSource): fixed review list in engine order
// - RecordingObserver (PassObserver): keeps every outcome for assertions

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;

use athena_client::ProductionReviewRow;
use sheets_client::{StatusRow, StatusValue};

use crate::error::{ReconcileError, Result};
use crate::outcome::{PassObserver, PassOutcome};
use crate::traits::{ReviewSource, StatusStore};

/// Build a status row. Everything not given is filled with something plausible.
pub fn status_row(row_index: usize, user_id: i64, status: StatusValue, updated_at: &str) -> StatusRow {
    StatusRow {
        row_index,
        nickname: format!("user{user_id}"),
        user_id,
        status,
        updated_at: updated_at.to_string(),
    }
}

pub fn review(user_id: i64, card_id: i64, created_at: &str) -> ProductionReviewRow {
    ProductionReviewRow {
        user_id,
        card_id,
        created_at: created_at.to_string(),
    }
}

/// Today's date as the real store writes it.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// MockStatusStore
// ---------------------------------------------------------------------------

/// Whole sheet held in memory, indexed by position like the real range.
#[derive(Default)]
pub struct MockStatusStore {
    rows: Mutex<Vec<StatusRow>>,
    resets: Mutex<Vec<usize>>,
    fetch_error: Option<ReconcileError>,
    /// Fail the reset of this row index (and record nothing for it).
    reset_error: Option<(usize, ReconcileError)>,
}

impl MockStatusStore {
    pub fn new(rows: Vec<StatusRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn failing_fetch(mut self, error: ReconcileError) -> Self {
        self.fetch_error = Some(error);
        self
    }

    pub fn failing_reset(mut self, row_index: usize, error: ReconcileError) -> Self {
        self.reset_error = Some((row_index, error));
        self
    }

    /// Row indexes passed to `reset_status`, in call order.
    pub fn resets(&self) -> Vec<usize> {
        self.resets.lock().unwrap().clone()
    }

    pub fn row(&self, row_index: usize) -> Option<StatusRow> {
        self.rows.lock().unwrap().get(row_index).cloned()
    }
}

#[async_trait]
impl StatusStore for MockStatusStore {
    async fn fetch_danger_rows(&self) -> Result<Vec<StatusRow>> {
        if let Some(err) = &self.fetch_error {
            return Err(err.clone());
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status.is_danger())
            .cloned()
            .collect())
    }

    async fn reset_status(&self, row_index: usize) -> Result<()> {
        if let Some((failing, err)) = &self.reset_error {
            if *failing == row_index {
                return Err(err.clone());
            }
        }
        self.resets.lock().unwrap().push(row_index);
        if let Some(row) = self.rows.lock().unwrap().get_mut(row_index) {
            row.status = StatusValue::None;
            row.updated_at = today();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockReviewSource
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockReviewSource {
    reviews: Vec<ProductionReviewRow>,
    error: Option<ReconcileError>,
    queried: Mutex<Vec<BTreeSet<i64>>>,
}

impl MockReviewSource {
    pub fn new(reviews: Vec<ProductionReviewRow>) -> Self {
        Self {
            reviews,
            ..Default::default()
        }
    }

    pub fn failing(error: ReconcileError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    /// User-id sets this source was asked about.
    pub fn queried(&self) -> Vec<BTreeSet<i64>> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReviewSource for MockReviewSource {
    async fn recent_reviews(&self, user_ids: &BTreeSet<i64>) -> Result<Vec<ProductionReviewRow>> {
        self.queried.lock().unwrap().push(user_ids.clone());
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        // The engine only returns rows for the requested users.
        Ok(self
            .reviews
            .iter()
            .filter(|r| user_ids.contains(&r.user_id))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// RecordingObserver
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingObserver {
    outcomes: Mutex<Vec<PassOutcome>>,
}

impl RecordingObserver {
    pub fn outcomes(&self) -> Vec<PassOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

impl PassObserver for RecordingObserver {
    fn record(&self, outcome: &PassOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }
}
