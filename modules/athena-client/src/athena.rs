use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_athena::config::Credentials;
use aws_sdk_athena::types::{
    QueryExecutionContext, QueryExecutionState, QueryExecutionStatus, ResultConfiguration, ResultSet,
};
use async_trait::async_trait;

use crate::engine::QueryEngine;
use crate::error::{AthenaError, Result};
use crate::types::{QueryState, ResultPage};

pub const DEFAULT_REGION: &str = "ap-northeast-2";

/// Everything needed to reach the engine and tell it where queries run and land.
#[derive(Debug, Clone)]
pub struct AthenaSettings {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub database: String,
    pub output_location: String,
}

/// Holds resolved SDK config; hands out a fresh connection per fetch.
#[derive(Debug, Clone)]
pub struct AthenaConnector {
    sdk_config: SdkConfig,
    database: String,
    output_location: String,
}

impl AthenaConnector {
    pub async fn new(settings: AthenaSettings) -> Self {
        let creds = Credentials::new(
            settings.access_key_id,
            settings.secret_access_key,
            None, // session token
            None, // expiry
            "status-reconciler-static",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        tracing::info!(
            region = %settings.region,
            database = %settings.database,
            "Athena connector initialized"
        );

        Self {
            sdk_config,
            database: settings.database,
            output_location: settings.output_location,
        }
    }

    /// Open a connection scoped to the caller. Dropping it releases the underlying client.
    pub fn connect(&self) -> AthenaTransport {
        AthenaTransport {
            client: aws_sdk_athena::Client::new(&self.sdk_config),
            database: self.database.clone(),
            output_location: self.output_location.clone(),
        }
    }
}

/// `QueryEngine` backed by the Athena API.
pub struct AthenaTransport {
    client: aws_sdk_athena::Client,
    database: String,
    output_location: String,
}

#[async_trait]
impl QueryEngine for AthenaTransport {
    async fn start_query(&self, query: &str) -> Result<String> {
        let resp = self
            .client
            .start_query_execution()
            .query_string(query)
            .query_execution_context(
                QueryExecutionContext::builder()
                    .database(&self.database)
                    .build(),
            )
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(&self.output_location)
                    .build(),
            )
            .send()
            .await?;

        resp.query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| AthenaError::Parse("start response carried no execution id".into()))
    }

    async fn query_state(&self, execution_id: &str) -> Result<QueryState> {
        let resp = self
            .client
            .get_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await?;

        let status = resp.query_execution().and_then(|q| q.status());
        Ok(map_state(status))
    }

    async fn results_page(
        &self,
        execution_id: &str,
        next_token: Option<String>,
    ) -> Result<ResultPage> {
        let resp = self
            .client
            .get_query_results()
            .query_execution_id(execution_id)
            .set_next_token(next_token)
            .send()
            .await?;

        let rows = result_rows(resp.result_set());

        Ok(ResultPage {
            rows,
            next_token: resp.next_token().map(str::to_string),
        })
    }
}

/// Collapse the engine's execution status into what the poller acts on.
fn map_state(status: Option<&QueryExecutionStatus>) -> QueryState {
    let reason = status
        .and_then(|s| s.state_change_reason())
        .unwrap_or("no reason given")
        .to_string();

    match status.and_then(|s| s.state()) {
        Some(QueryExecutionState::Succeeded) => QueryState::Succeeded,
        Some(QueryExecutionState::Failed) => QueryState::Failed { reason },
        Some(QueryExecutionState::Cancelled) => QueryState::Cancelled,
        // QUEUED, RUNNING, and anything the SDK doesn't know yet
        _ => QueryState::Pending,
    }
}

/// Varchar cells of every row, header included. Null cells stay `None`.
fn result_rows(set: Option<&ResultSet>) -> Vec<Vec<Option<String>>> {
    set.map(|set| {
        set.rows()
            .iter()
            .map(|row| {
                row.data()
                    .iter()
                    .map(|d| d.var_char_value().map(str::to_string))
                    .collect()
            })
            .collect()
    })
    .unwrap_or_default()
}
