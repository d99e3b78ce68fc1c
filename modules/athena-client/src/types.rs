/// One review record read back from the production review log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionReviewRow {
    pub user_id: i64,
    pub card_id: i64,
    pub created_at: String,
}

/// Execution state as reported by the engine, collapsed to what the poller cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    /// Queued or running. Keep polling.
    Pending,
    Succeeded,
    Failed { reason: String },
    Cancelled,
}

/// A submitted query that has not yet been observed to finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryHandle {
    pub execution_id: String,
}

/// A query observed in the `Succeeded` state; only these can be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHandle {
    pub execution_id: String,
}

/// One page of raw result rows. Cells are the engine's varchar values; `None` is SQL null.
#[derive(Debug, Clone, Default)]
pub struct ResultPage {
    pub rows: Vec<Vec<Option<String>>>,
    pub next_token: Option<String>,
}
