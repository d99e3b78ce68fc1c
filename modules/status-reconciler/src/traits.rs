// Seams between the reconciliation pass and the two external systems.
//
// StatusStore: the moderation status sheet (read danger rows, reset one row).
// ReviewSource: the production review log in the query engine.
//
// Production impls wrap sheets-client and athena-client; `testing` has
// in-memory versions so a whole pass runs with no network.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use athena_client::{ProductionReviewRow, QueryEngine, QueryEngineClient, Sleeper};
use sheets_client::{SheetsStatusStore, StatusRow};

use crate::error::Result;

#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Rows whose status is not `NONE`, with their positional `row_index`.
    async fn fetch_danger_rows(&self) -> Result<Vec<StatusRow>>;

    /// Unconditionally set the row at `row_index` to `NONE`, dated today.
    async fn reset_status(&self, row_index: usize) -> Result<()>;
}

#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Reviews for the given users, in the order the engine returns them.
    async fn recent_reviews(&self, user_ids: &BTreeSet<i64>) -> Result<Vec<ProductionReviewRow>>;
}

#[async_trait]
impl StatusStore for SheetsStatusStore {
    async fn fetch_danger_rows(&self) -> Result<Vec<StatusRow>> {
        Ok(self.fetch_danger_rows().await?)
    }

    async fn reset_status(&self, row_index: usize) -> Result<()> {
        Ok(self.reset_status(row_index).await?)
    }
}

#[async_trait]
impl<E: QueryEngine, S: Sleeper> ReviewSource for QueryEngineClient<E, S> {
    async fn recent_reviews(&self, user_ids: &BTreeSet<i64>) -> Result<Vec<ProductionReviewRow>> {
        Ok(self.recent_production_reviews(user_ids).await?)
    }
}

// Shared handles, so tests can keep a reference to a mock while a Reconciler owns it.

#[async_trait]
impl<T: StatusStore + ?Sized> StatusStore for &T {
    async fn fetch_danger_rows(&self) -> Result<Vec<StatusRow>> {
        (**self).fetch_danger_rows().await
    }

    async fn reset_status(&self, row_index: usize) -> Result<()> {
        (**self).reset_status(row_index).await
    }
}

#[async_trait]
impl<T: StatusStore + ?Sized> StatusStore for Arc<T> {
    async fn fetch_danger_rows(&self) -> Result<Vec<StatusRow>> {
        (**self).fetch_danger_rows().await
    }

    async fn reset_status(&self, row_index: usize) -> Result<()> {
        (**self).reset_status(row_index).await
    }
}

#[async_trait]
impl<T: ReviewSource + ?Sized> ReviewSource for &T {
    async fn recent_reviews(&self, user_ids: &BTreeSet<i64>) -> Result<Vec<ProductionReviewRow>> {
        (**self).recent_reviews(user_ids).await
    }
}

#[async_trait]
impl<T: ReviewSource + ?Sized> ReviewSource for Arc<T> {
    async fn recent_reviews(&self, user_ids: &BTreeSet<i64>) -> Result<Vec<ProductionReviewRow>> {
        (**self).recent_reviews(user_ids).await
    }
}
