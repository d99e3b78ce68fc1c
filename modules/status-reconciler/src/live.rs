use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use athena_client::{AthenaConnector, QueryEngineClient};
use sheets_client::{SheetRange, SheetsStatusStore, TokenProvider};

use crate::config::Config;
use crate::outcome::PassOutcome;
use crate::reconcile::Reconciler;
use crate::server::PassTrigger;

/// Builds fresh clients for every pass.
///
/// Only the SDK config and the token cache outlive a pass; the engine
/// connection and the HTTP client are created here and dropped when the
/// pass returns, on success or failure alike.
pub struct LivePassTrigger {
    connector: AthenaConnector,
    tokens: Arc<dyn TokenProvider>,
    sheets_id: String,
    status_range: SheetRange,
    reviews_query: String,
    poll_interval: Duration,
}

impl LivePassTrigger {
    pub fn new(config: &Config, connector: AthenaConnector, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            connector,
            tokens,
            sheets_id: config.sheets_id.clone(),
            status_range: config.status_range.clone(),
            reviews_query: config.reviews_query.clone(),
            poll_interval: config.poll_interval,
        }
    }
}

#[async_trait]
impl PassTrigger for LivePassTrigger {
    async fn run_pass(&self) -> PassOutcome {
        let store = SheetsStatusStore::new(
            &self.sheets_id,
            self.status_range.clone(),
            self.tokens.clone(),
        );
        let reviews = QueryEngineClient::new(self.connector.connect(), self.reviews_query.as_str())
            .with_poll_interval(self.poll_interval);

        Reconciler::new(store, reviews).run_pass().await
    }
}
