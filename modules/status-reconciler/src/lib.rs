pub mod config;
pub mod error;
pub mod live;
pub mod outcome;
pub mod reconcile;
pub mod server;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use config::Config;
pub use error::{ErrorKind, ReconcileError, Result};
pub use outcome::{PassObserver, PassOutcome, PassReport, TracingObserver};
pub use reconcile::{match_reviews, newer_than_status, Reconciler, StatusReviewPair};
pub use server::{router, AppState, PassTrigger, ACK};
pub use traits::{ReviewSource, StatusStore};
