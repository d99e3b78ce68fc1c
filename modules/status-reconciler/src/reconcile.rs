use std::collections::{BTreeSet, HashMap};

use tracing::{info, Instrument};
use uuid::Uuid;

use athena_client::ProductionReviewRow;
use sheets_client::StatusRow;

use crate::error::Result;
use crate::outcome::{PassOutcome, PassReport};
use crate::traits::{ReviewSource, StatusStore};

/// A danger row together with the review it was matched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReviewPair<'a> {
    pub status_row: &'a StatusRow,
    pub review: &'a ProductionReviewRow,
}

impl StatusReviewPair<'_> {
    /// Dates compare as strings; both sides are `YYYY-MM-DD`-prefixed.
    pub fn review_is_newer(&self) -> bool {
        self.review.created_at.as_str() >= self.status_row.updated_at.as_str()
    }
}

/// Pair each row with the first review for the same user, in review order.
///
/// Relies on the review source returning newest-first; this does not look for
/// the latest review itself. Rows without any review are dropped.
pub fn match_reviews<'a>(
    rows: &'a [StatusRow],
    reviews: &'a [ProductionReviewRow],
) -> Vec<StatusReviewPair<'a>> {
    let mut first_by_user: HashMap<i64, &ProductionReviewRow> = HashMap::new();
    for review in reviews {
        first_by_user.entry(review.user_id).or_insert(review);
    }

    rows.iter()
        .filter_map(|status_row| {
            first_by_user
                .get(&status_row.user_id)
                .map(|review| StatusReviewPair { status_row, review })
        })
        .collect()
}

/// Pairs whose review is at least as recent as the status change.
pub fn newer_than_status<'a>(pairs: Vec<StatusReviewPair<'a>>) -> Vec<StatusReviewPair<'a>> {
    pairs.into_iter().filter(|p| p.review_is_newer()).collect()
}

/// One reconciliation pass over a status store and a review source.
pub struct Reconciler<S, R> {
    store: S,
    reviews: R,
}

impl<S: StatusStore, R: ReviewSource> Reconciler<S, R> {
    pub fn new(store: S, reviews: R) -> Self {
        Self { store, reviews }
    }

    /// Fetch, join, filter, reset. Never returns an error: failures are part of the outcome.
    pub async fn run_pass(&self) -> PassOutcome {
        let run_id = Uuid::new_v4();
        let mut report = PassReport::new(run_id);

        let result = self
            .execute(&mut report)
            .instrument(tracing::info_span!("reconcile_pass", %run_id))
            .await;

        PassOutcome::from_result(report, result)
    }

    async fn execute(&self, report: &mut PassReport) -> Result<()> {
        let danger = self.store.fetch_danger_rows().await?;
        report.danger_rows = danger.len();

        let user_ids: BTreeSet<i64> = danger.iter().map(|r| r.user_id).collect();
        let reviews = self.reviews.recent_reviews(&user_ids).await?;
        report.reviews = reviews.len();

        let pairs = match_reviews(&danger, &reviews);
        report.matched = pairs.len();

        let eligible = newer_than_status(pairs);
        report.eligible = eligible.len();

        info!(
            danger_rows = report.danger_rows,
            reviews = report.reviews,
            matched = report.matched,
            eligible = report.eligible,
            "Resolved rows to reset"
        );

        // Sequential, in pair order. A failure leaves earlier resets in place.
        for pair in &eligible {
            let row_index = pair.status_row.row_index;
            self.store.reset_status(row_index).await?;
            report.reset_rows.push(row_index);
        }

        Ok(())
    }
}
