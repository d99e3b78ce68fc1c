pub mod athena;
pub mod engine;
pub mod error;
pub mod types;

pub use athena::{AthenaConnector, AthenaSettings, AthenaTransport, DEFAULT_REGION};
pub use engine::{QueryEngine, Sleeper, TokioSleeper};
pub use error::{AthenaError, Result};
pub use types::{ProductionReviewRow, QueryHandle, QueryState, ResultHandle, ResultPage};

use std::collections::BTreeSet;
use std::time::Duration;

/// Placeholder in the query template that receives the comma-joined user ids.
pub const USER_IDS_PLACEHOLDER: &str = "{user_ids}";

/// Newest reviews first, so the first row per user is that user's latest review.
pub const DEFAULT_REVIEWS_QUERY: &str = "SELECT user_id, card_id, created_at \
FROM production_reviews WHERE user_id IN ({user_ids}) ORDER BY created_at DESC";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Columns every result row must carry: user_id, card_id, created_at.
const REVIEW_COLUMNS: usize = 3;

pub struct QueryEngineClient<E, S = TokioSleeper> {
    engine: E,
    sleeper: S,
    query_template: String,
    poll_interval: Duration,
}

impl<E: QueryEngine> QueryEngineClient<E, TokioSleeper> {
    pub fn new(engine: E, query_template: impl Into<String>) -> Self {
        Self {
            engine,
            sleeper: TokioSleeper,
            query_template: query_template.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl<E: QueryEngine, S: Sleeper> QueryEngineClient<E, S> {
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> QueryEngineClient<E, S2> {
        QueryEngineClient {
            engine: self.engine,
            sleeper,
            query_template: self.query_template,
            poll_interval: self.poll_interval,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Render the query template for a set of user ids (ascending, comma-joined).
    pub fn build_query(&self, user_ids: &BTreeSet<i64>) -> String {
        let ids = user_ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        self.query_template.replace(USER_IDS_PLACEHOLDER, &ids)
    }

    pub async fn submit_query(&self, user_ids: &BTreeSet<i64>) -> Result<QueryHandle> {
        let query = self.build_query(user_ids);
        let execution_id = self.engine.start_query(&query).await?;
        tracing::info!(
            query_execution_id = %execution_id,
            user_count = user_ids.len(),
            "Athena query submitted"
        );
        Ok(QueryHandle { execution_id })
    }

    /// Poll until the execution leaves the pending state.
    ///
    /// No timeout: an execution that never reaches a terminal state keeps this
    /// future pending forever. Stops on the first terminal state it sees.
    pub async fn await_completion(&self, handle: QueryHandle) -> Result<ResultHandle> {
        let mut polls: u64 = 0;
        loop {
            polls += 1;
            match self.engine.query_state(&handle.execution_id).await? {
                QueryState::Succeeded => {
                    tracing::info!(
                        query_execution_id = %handle.execution_id,
                        polls,
                        "Athena query succeeded"
                    );
                    return Ok(ResultHandle {
                        execution_id: handle.execution_id,
                    });
                }
                QueryState::Failed { reason } => {
                    return Err(AthenaError::QueryFailed { reason });
                }
                QueryState::Cancelled => return Err(AthenaError::QueryCancelled),
                QueryState::Pending => {
                    tracing::debug!(
                        query_execution_id = %handle.execution_id,
                        polls,
                        "Query still in progress"
                    );
                    self.sleeper.sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// Read every result page. The first row of the first page is the column header.
    pub async fn fetch_results(&self, handle: &ResultHandle) -> Result<Vec<ProductionReviewRow>> {
        let mut reviews = Vec::new();
        let mut next_token = None;
        let mut page_no = 0usize;

        loop {
            let page = self
                .engine
                .results_page(&handle.execution_id, next_token.take())
                .await?;

            let skip = usize::from(page_no == 0);
            for (row_no, cells) in page.rows.iter().enumerate().skip(skip) {
                reviews.push(parse_review_row(cells, page_no, row_no)?);
            }

            match page.next_token {
                Some(token) => {
                    next_token = Some(token);
                    page_no += 1;
                }
                None => break,
            }
        }

        tracing::info!(
            query_execution_id = %handle.execution_id,
            pages = page_no + 1,
            count = reviews.len(),
            "Fetched production reviews"
        );
        Ok(reviews)
    }

    /// Submit, wait, read. An empty id set short-circuits without touching the engine.
    pub async fn recent_production_reviews(
        &self,
        user_ids: &BTreeSet<i64>,
    ) -> Result<Vec<ProductionReviewRow>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let handle = self.submit_query(user_ids).await?;
        let result = self.await_completion(handle).await?;
        self.fetch_results(&result).await
    }
}

fn parse_review_row(
    cells: &[Option<String>],
    page_no: usize,
    row_no: usize,
) -> Result<ProductionReviewRow> {
    let at = format!("page {page_no} row {row_no}");
    if cells.len() != REVIEW_COLUMNS {
        return Err(AthenaError::Parse(format!(
            "{at}: expected {REVIEW_COLUMNS} columns, got {}",
            cells.len()
        )));
    }

    Ok(ProductionReviewRow {
        user_id: int_cell(cells, 0, "user_id", &at)?,
        card_id: int_cell(cells, 1, "card_id", &at)?,
        created_at: text_cell(cells, 2, "created_at", &at)?.to_string(),
    })
}

fn text_cell<'a>(cells: &'a [Option<String>], idx: usize, name: &str, at: &str) -> Result<&'a str> {
    cells[idx]
        .as_deref()
        .ok_or_else(|| AthenaError::Parse(format!("{at}: {name} is null")))
}

fn int_cell(cells: &[Option<String>], idx: usize, name: &str, at: &str) -> Result<i64> {
    let raw = text_cell(cells, idx, name, at)?;
    raw.trim().parse().map_err(|_| {
        AthenaError::Parse(format!("{at}: {name} is not an integer: {raw:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted engine: hands out states and pages in order, records calls.
    #[derive(Default)]
    struct ScriptedEngine {
        states: Mutex<VecDeque<QueryState>>,
        pages: Mutex<VecDeque<ResultPage>>,
        queries: Mutex<Vec<String>>,
        state_calls: Mutex<usize>,
        page_tokens: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedEngine {
        fn with_states(states: Vec<QueryState>) -> Self {
            Self {
                states: Mutex::new(states.into()),
                ..Default::default()
            }
        }

        fn with_pages(pages: Vec<ResultPage>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl QueryEngine for ScriptedEngine {
        async fn start_query(&self, query: &str) -> Result<String> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok("exec-1".to_string())
        }

        async fn query_state(&self, _execution_id: &str) -> Result<QueryState> {
            *self.state_calls.lock().unwrap() += 1;
            self.states
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AthenaError::Network("no more scripted states".into()))
        }

        async fn results_page(
            &self,
            _execution_id: &str,
            next_token: Option<String>,
        ) -> Result<ResultPage> {
            self.page_tokens.lock().unwrap().push(next_token);
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AthenaError::Network("no more scripted pages".into()))
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    fn row(cells: &[&str]) -> Vec<Option<String>> {
        cells.iter().map(|c| Some(c.to_string())).collect()
    }

    fn header() -> Vec<Option<String>> {
        row(&["user_id", "card_id", "created_at"])
    }

    fn handle() -> QueryHandle {
        QueryHandle {
            execution_id: "exec-1".into(),
        }
    }

    #[tokio::test]
    async fn polls_until_succeeded_sleeping_between_polls() {
        let engine = ScriptedEngine::with_states(vec![
            QueryState::Pending,
            QueryState::Pending,
            QueryState::Succeeded,
        ]);
        let sleeper = RecordingSleeper::default();
        let client = QueryEngineClient::new(&engine, DEFAULT_REVIEWS_QUERY).with_sleeper(&sleeper);

        let result = client.await_completion(handle()).await.unwrap();

        assert_eq!(result.execution_id, "exec-1");
        assert_eq!(*engine.state_calls.lock().unwrap(), 3);
        assert_eq!(
            *sleeper.sleeps.lock().unwrap(),
            vec![DEFAULT_POLL_INTERVAL, DEFAULT_POLL_INTERVAL]
        );
    }

    #[tokio::test]
    async fn failed_state_stops_polling_with_reason() {
        let engine = ScriptedEngine::with_states(vec![
            QueryState::Pending,
            QueryState::Failed {
                reason: "SYNTAX_ERROR".into(),
            },
            QueryState::Succeeded,
        ]);
        let sleeper = RecordingSleeper::default();
        let client = QueryEngineClient::new(&engine, DEFAULT_REVIEWS_QUERY).with_sleeper(&sleeper);

        let err = client.await_completion(handle()).await.unwrap_err();

        assert!(matches!(err, AthenaError::QueryFailed { ref reason } if reason == "SYNTAX_ERROR"));
        assert_eq!(*engine.state_calls.lock().unwrap(), 2);
        assert_eq!(sleeper.sleeps.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_state_stops_polling_immediately() {
        let engine = ScriptedEngine::with_states(vec![QueryState::Cancelled, QueryState::Pending]);
        let sleeper = RecordingSleeper::default();
        let client = QueryEngineClient::new(&engine, DEFAULT_REVIEWS_QUERY).with_sleeper(&sleeper);

        let err = client.await_completion(handle()).await.unwrap_err();

        assert!(matches!(err, AthenaError::QueryCancelled));
        assert_eq!(*engine.state_calls.lock().unwrap(), 1);
        assert!(sleeper.sleeps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn poll_interval_is_configurable() {
        let engine = ScriptedEngine::with_states(vec![QueryState::Pending, QueryState::Succeeded]);
        let sleeper = RecordingSleeper::default();
        let client = QueryEngineClient::new(&engine, DEFAULT_REVIEWS_QUERY)
            .with_sleeper(&sleeper)
            .with_poll_interval(Duration::from_millis(250));

        client.await_completion(handle()).await.unwrap();

        assert_eq!(
            *sleeper.sleeps.lock().unwrap(),
            vec![Duration::from_millis(250)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn default_sleeper_waits_on_tokio_clock() {
        let engine = ScriptedEngine::with_states(vec![QueryState::Pending, QueryState::Succeeded]);
        let client = QueryEngineClient::new(&engine, DEFAULT_REVIEWS_QUERY);

        let started = tokio::time::Instant::now();
        client.await_completion(handle()).await.unwrap();

        assert!(started.elapsed() >= DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test]
    async fn header_skipped_only_on_first_page() {
        let engine = ScriptedEngine::with_pages(vec![
            ResultPage {
                rows: vec![header(), row(&["10", "5", "2023-01-05"])],
                next_token: Some("t1".into()),
            },
            ResultPage {
                rows: vec![row(&["11", "6", "2023-01-04"]), row(&["10", "7", "2023-01-01"])],
                next_token: None,
            },
        ]);
        let client = QueryEngineClient::new(&engine, DEFAULT_REVIEWS_QUERY);

        let reviews = client
            .fetch_results(&ResultHandle {
                execution_id: "exec-1".into(),
            })
            .await
            .unwrap();

        assert_eq!(
            reviews,
            vec![
                ProductionReviewRow { user_id: 10, card_id: 5, created_at: "2023-01-05".into() },
                ProductionReviewRow { user_id: 11, card_id: 6, created_at: "2023-01-04".into() },
                ProductionReviewRow { user_id: 10, card_id: 7, created_at: "2023-01-01".into() },
            ]
        );
        assert_eq!(
            *engine.page_tokens.lock().unwrap(),
            vec![None, Some("t1".to_string())]
        );
    }

    #[tokio::test]
    async fn header_only_result_is_empty() {
        let engine = ScriptedEngine::with_pages(vec![ResultPage {
            rows: vec![header()],
            next_token: None,
        }]);
        let client = QueryEngineClient::new(&engine, DEFAULT_REVIEWS_QUERY);

        let reviews = client
            .fetch_results(&ResultHandle { execution_id: "exec-1".into() })
            .await
            .unwrap();

        assert!(reviews.is_empty());
    }

    #[tokio::test]
    async fn non_numeric_user_id_is_parse_error() {
        let engine = ScriptedEngine::with_pages(vec![ResultPage {
            rows: vec![header(), row(&["ten", "5", "2023-01-05"])],
            next_token: None,
        }]);
        let client = QueryEngineClient::new(&engine, DEFAULT_REVIEWS_QUERY);

        let err = client
            .fetch_results(&ResultHandle { execution_id: "exec-1".into() })
            .await
            .unwrap_err();

        assert!(matches!(err, AthenaError::Parse(ref msg) if msg.contains("user_id")));
    }

    #[test]
    fn wrong_column_count_is_parse_error() {
        let err = parse_review_row(&row(&["10", "5"]), 0, 1).unwrap_err();
        assert!(matches!(err, AthenaError::Parse(_)));
    }

    #[test]
    fn null_cell_is_parse_error() {
        let cells = vec![Some("10".to_string()), Some("5".to_string()), None];
        let err = parse_review_row(&cells, 0, 1).unwrap_err();
        assert!(matches!(err, AthenaError::Parse(ref msg) if msg.contains("created_at")));
    }

    #[tokio::test]
    async fn submit_renders_sorted_user_ids() {
        let engine = ScriptedEngine::default();
        let client = QueryEngineClient::new(&engine, "SELECT * FROM t WHERE id IN ({user_ids})");

        let ids: BTreeSet<i64> = [30, 10, 20].into_iter().collect();
        let handle = client.submit_query(&ids).await.unwrap();

        assert_eq!(handle.execution_id, "exec-1");
        assert_eq!(
            *engine.queries.lock().unwrap(),
            vec!["SELECT * FROM t WHERE id IN (10, 20, 30)".to_string()]
        );
    }

    #[tokio::test]
    async fn empty_user_set_never_reaches_engine() {
        let engine = ScriptedEngine::default();
        let client = QueryEngineClient::new(&engine, DEFAULT_REVIEWS_QUERY);

        let reviews = client
            .recent_production_reviews(&BTreeSet::new())
            .await
            .unwrap();

        assert!(reviews.is_empty());
        assert!(engine.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_to_end_submit_poll_fetch() {
        let engine = ScriptedEngine {
            states: Mutex::new(vec![QueryState::Pending, QueryState::Succeeded].into()),
            pages: Mutex::new(
                vec![ResultPage {
                    rows: vec![header(), row(&["10", "5", "2023-01-05"])],
                    next_token: None,
                }]
                .into(),
            ),
            ..Default::default()
        };
        let sleeper = RecordingSleeper::default();
        let client = QueryEngineClient::new(&engine, DEFAULT_REVIEWS_QUERY).with_sleeper(&sleeper);

        let ids: BTreeSet<i64> = [10].into_iter().collect();
        let reviews = client.recent_production_reviews(&ids).await.unwrap();

        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].card_id, 5);
    }
}
