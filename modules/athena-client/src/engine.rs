//! Seams between the poll/paginate logic and the outside world.
//!
//! `QueryEngine` is the three raw calls the client makes against the engine.
//! `Sleeper` is the wait between polls. Both are swapped out in tests so the
//! state machine runs without a network or a real clock.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{QueryState, ResultPage};

#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Start executing `query`. Returns the engine's execution id.
    async fn start_query(&self, query: &str) -> Result<String>;

    /// Current state of an execution.
    async fn query_state(&self, execution_id: &str) -> Result<QueryState>;

    /// One page of results. `next_token` is `None` for the first page.
    async fn results_page(
        &self,
        execution_id: &str,
        next_token: Option<String>,
    ) -> Result<ResultPage>;
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleep on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
impl<T: QueryEngine + ?Sized> QueryEngine for &T {
    async fn start_query(&self, query: &str) -> Result<String> {
        (**self).start_query(query).await
    }

    async fn query_state(&self, execution_id: &str) -> Result<QueryState> {
        (**self).query_state(execution_id).await
    }

    async fn results_page(
        &self,
        execution_id: &str,
        next_token: Option<String>,
    ) -> Result<ResultPage> {
        (**self).results_page(execution_id, next_token).await
    }
}

#[async_trait]
impl<T: Sleeper + ?Sized> Sleeper for &T {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}
