use std::fmt;

use uuid::Uuid;

use crate::error::ReconcileError;

/// Counters from one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub run_id: Uuid,
    pub danger_rows: usize,
    pub reviews: usize,
    pub matched: usize,
    pub eligible: usize,
    /// Row indexes reset so far, in the order the writes were issued.
    pub reset_rows: Vec<usize>,
}

impl PassReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            danger_rows: 0,
            reviews: 0,
            matched: 0,
            eligible: 0,
            reset_rows: Vec::new(),
        }
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={} danger_rows={} reviews={} matched={} eligible={} reset={}",
            self.run_id,
            self.danger_rows,
            self.reviews,
            self.matched,
            self.eligible,
            self.reset_rows.len(),
        )
    }
}

/// How a pass ended. Resets already written stay written in every case.
#[derive(Debug, Clone)]
pub enum PassOutcome {
    Completed {
        report: PassReport,
    },
    /// Some resets were applied before a later step failed.
    Partial {
        report: PassReport,
        error: ReconcileError,
    },
    /// Nothing was written.
    Failed {
        report: PassReport,
        error: ReconcileError,
    },
}

impl PassOutcome {
    pub(crate) fn from_result(report: PassReport, result: Result<(), ReconcileError>) -> Self {
        match result {
            Ok(()) => Self::Completed { report },
            Err(error) if report.reset_rows.is_empty() => Self::Failed { report, error },
            Err(error) => Self::Partial { report, error },
        }
    }

    pub fn report(&self) -> &PassReport {
        match self {
            Self::Completed { report }
            | Self::Partial { report, .. }
            | Self::Failed { report, .. } => report,
        }
    }

    pub fn error(&self) -> Option<&ReconcileError> {
        match self {
            Self::Completed { .. } => None,
            Self::Partial { error, .. } | Self::Failed { error, .. } => Some(error),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Where pass outcomes go once the pass is over.
pub trait PassObserver: Send + Sync {
    fn record(&self, outcome: &PassOutcome);
}

/// Logs every outcome through `tracing`.
pub struct TracingObserver;

impl PassObserver for TracingObserver {
    fn record(&self, outcome: &PassOutcome) {
        match outcome {
            PassOutcome::Completed { report } => {
                tracing::info!(
                    run_id = %report.run_id,
                    reset = report.reset_rows.len(),
                    "Reconciliation pass complete. {report}"
                );
            }
            PassOutcome::Partial { report, error } => {
                tracing::error!(
                    run_id = %report.run_id,
                    error_kind = %error.kind(),
                    error = %error,
                    reset_rows = ?report.reset_rows,
                    "Reconciliation pass stopped after partial resets. {report}"
                );
            }
            PassOutcome::Failed { report, error } => {
                tracing::error!(
                    run_id = %report.run_id,
                    error_kind = %error.kind(),
                    error = %error,
                    "Reconciliation pass failed. {report}"
                );
            }
        }
    }
}
