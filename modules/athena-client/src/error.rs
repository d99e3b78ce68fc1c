use thiserror::Error;

pub type Result<T> = std::result::Result<T, AthenaError>;

#[derive(Debug, Error)]
pub enum AthenaError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Query was cancelled")]
    QueryCancelled,

    #[error("Parse error: {0}")]
    Parse(String),
}

impl<E, R> From<aws_sdk_athena::error::SdkError<E, R>> for AthenaError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(err: aws_sdk_athena::error::SdkError<E, R>) -> Self {
        AthenaError::Network(aws_sdk_athena::error::DisplayErrorContext(&err).to_string())
    }
}
