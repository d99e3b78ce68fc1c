use std::fmt;

use athena_client::AthenaError;
use sheets_client::SheetsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Everything that can stop a reconciliation pass.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Query execution error: {reason}")]
    QueryExecution { reason: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Auth(_) => ErrorKind::Auth,
            Self::QueryExecution { .. } => ErrorKind::QueryExecution,
            Self::Parse(_) => ErrorKind::Parse,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Auth,
    QueryExecution,
    Parse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Auth => write!(f, "auth"),
            Self::QueryExecution => write!(f, "query_execution"),
            Self::Parse => write!(f, "parse"),
        }
    }
}

impl From<AthenaError> for ReconcileError {
    fn from(err: AthenaError) -> Self {
        match err {
            AthenaError::Network(msg) => Self::Transport(msg),
            AthenaError::QueryFailed { reason } => Self::QueryExecution { reason },
            AthenaError::QueryCancelled => Self::QueryExecution {
                reason: "cancelled".to_string(),
            },
            AthenaError::Parse(msg) => Self::Parse(msg),
        }
    }
}

impl From<SheetsError> for ReconcileError {
    fn from(err: SheetsError) -> Self {
        match err {
            SheetsError::Network(msg) => Self::Transport(msg),
            SheetsError::Api {
                status: status @ (401 | 403),
                message,
            } => Self::Auth(format!("sheets returned {status}: {message}")),
            SheetsError::Api { status, message } => {
                Self::Transport(format!("sheets returned {status}: {message}"))
            }
            SheetsError::Auth(msg) => Self::Auth(msg),
            SheetsError::Parse(msg) => Self::Parse(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_query_maps_to_execution_error() {
        let err: ReconcileError = AthenaError::QueryCancelled.into();
        assert_eq!(err.kind(), ErrorKind::QueryExecution);
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn failed_query_keeps_reason() {
        let err: ReconcileError = AthenaError::QueryFailed {
            reason: "TABLE_NOT_FOUND".into(),
        }
        .into();
        assert!(matches!(err, ReconcileError::QueryExecution { ref reason } if reason == "TABLE_NOT_FOUND"));
    }

    #[test]
    fn sheets_http_failure_is_transport() {
        let err: ReconcileError = SheetsError::Api {
            status: 503,
            message: "unavailable".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn sheets_rejected_credentials_are_auth() {
        for status in [401, 403] {
            let err: ReconcileError = SheetsError::Api {
                status,
                message: "The caller does not have permission".into(),
            }
            .into();
            assert_eq!(err.kind(), ErrorKind::Auth, "status {status}");
            assert!(err.to_string().contains(&status.to_string()));
        }
    }

    #[test]
    fn sheets_auth_stays_auth() {
        let err: ReconcileError = SheetsError::Auth("expired key".into()).into();
        assert_eq!(err.kind(), ErrorKind::Auth);
    }
}
