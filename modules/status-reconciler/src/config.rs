use std::env;
use std::time::Duration;

use athena_client::{AthenaSettings, DEFAULT_REGION, DEFAULT_REVIEWS_QUERY};
use sheets_client::SheetRange;

const DEFAULT_STATUS_RANGE: &str = "Status!A2:D";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Query engine
    pub athena_access_key_id: String,
    pub athena_secret_access_key: String,
    pub athena_region: String,
    pub athena_database: String,
    pub athena_output_location: String,
    pub reviews_query: String,
    pub poll_interval: Duration,

    // Status sheet
    pub google_service_account_path: String,
    pub sheets_id: String,
    pub status_range: SheetRange,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    /// Panics with a clear message if required vars are missing or malformed.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let status_range = env::var("STATUS_SHEET_RANGE")
            .unwrap_or_else(|_| DEFAULT_STATUS_RANGE.to_string());

        Self {
            athena_access_key_id: required_env("ATHENA_ACCESS_KEY_ID"),
            athena_secret_access_key: required_env("ATHENA_SECRET_ACCESS_KEY"),
            athena_region: env::var("ATHENA_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            athena_database: required_env("ATHENA_DB_NAME"),
            athena_output_location: required_env("ATHENA_OUTPUT_LOCATION"),
            reviews_query: env::var("ATHENA_REVIEWS_QUERY")
                .unwrap_or_else(|_| DEFAULT_REVIEWS_QUERY.to_string()),
            poll_interval: Duration::from_millis(
                env::var("ATHENA_POLL_INTERVAL_MS")
                    .unwrap_or_else(|_| DEFAULT_POLL_INTERVAL_MS.to_string())
                    .parse()
                    .expect("ATHENA_POLL_INTERVAL_MS must be a number"),
            ),
            google_service_account_path: required_env("GOOGLE_SERVICE_ACCOUNT_PATH"),
            sheets_id: required_env("SHEETS_ID"),
            status_range: status_range
                .parse()
                .unwrap_or_else(|e| panic!("STATUS_SHEET_RANGE {status_range:?} is invalid: {e}")),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
        }
    }

    pub fn athena_settings(&self) -> AthenaSettings {
        AthenaSettings {
            region: self.athena_region.clone(),
            access_key_id: self.athena_access_key_id.clone(),
            secret_access_key: self.athena_secret_access_key.clone(),
            database: self.athena_database.clone(),
            output_location: self.athena_output_location.clone(),
        }
    }

    /// Log the loaded config with secrets cut down to a short prefix.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.len().min(4);
            format!("{}...({} chars)", &val[..n], val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  ATHENA_ACCESS_KEY_ID: {}", preview(&self.athena_access_key_id));
        tracing::info!("  ATHENA_SECRET_ACCESS_KEY: {}", preview(&self.athena_secret_access_key));
        tracing::info!("  ATHENA_REGION: {}", self.athena_region);
        tracing::info!("  ATHENA_DB_NAME: {}", self.athena_database);
        tracing::info!("  ATHENA_OUTPUT_LOCATION: {}", self.athena_output_location);
        tracing::info!("  ATHENA_POLL_INTERVAL_MS: {}", self.poll_interval.as_millis());
        tracing::info!("  GOOGLE_SERVICE_ACCOUNT_PATH: {}", self.google_service_account_path);
        tracing::info!("  SHEETS_ID: {}", preview(&self.sheets_id));
        tracing::info!("  STATUS_SHEET_RANGE: {}", self.status_range);
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
