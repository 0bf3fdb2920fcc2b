//! Collect-all outcome of a per-user fan-out.

use futures::future::join_all;
use std::future::Future;

use relay_core::error::AppError;
use relay_core::types::UserId;

use crate::router::delivery::DeliveryOutcome;

/// Outcome of delivering (or creating and delivering) to each of a set of users.
///
/// One user's failure never stops the others; every failure is kept here
/// with the user it belongs to.
#[derive(Debug, Default)]
pub struct FanOutReport {
    /// Users attempted.
    pub targets: usize,
    /// Users that received the event on at least one connection.
    pub delivered: usize,
    /// Users with no live connection.
    pub skipped: usize,
    /// Per-user failures.
    pub failed: Vec<(UserId, AppError)>,
}

impl FanOutReport {
    /// Runs one future per user concurrently and folds the results.
    pub async fn collect<I, F>(tasks: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = (UserId, Result<DeliveryOutcome, AppError>)>,
    {
        let mut report = Self::default();
        for (user, result) in join_all(tasks).await {
            report.record(user, result);
        }
        report
    }

    /// Folds one user's result into the report.
    pub fn record(&mut self, user: UserId, result: Result<DeliveryOutcome, AppError>) {
        self.targets += 1;
        match result {
            Ok(DeliveryOutcome::Delivered(_)) => self.delivered += 1,
            Ok(DeliveryOutcome::Offline) => self.skipped += 1,
            Ok(DeliveryOutcome::Dropped) => {
                let err = AppError::delivery(format!("No connection of {user} accepted the event"));
                self.failed.push((user, err));
            }
            Err(err) => self.failed.push((user, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collects_every_outcome() {
        let outcomes = vec![
            ("a", Ok(DeliveryOutcome::Delivered(2))),
            ("b", Ok(DeliveryOutcome::Offline)),
            ("c", Err(AppError::external("boom"))),
            ("d", Ok(DeliveryOutcome::Dropped)),
            ("e", Ok(DeliveryOutcome::Delivered(1))),
        ];
        let report = FanOutReport::collect(
            outcomes
                .into_iter()
                .map(|(user, result)| async move { (UserId::from(user), result) }),
        )
        .await;

        assert_eq!(report.targets, 5);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed.len(), 2);
        let failed: Vec<_> = report.failed.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(failed, vec!["c", "d"]);
    }

    #[tokio::test]
    async fn test_empty_fan_out_has_no_failures() {
        let tasks: Vec<std::future::Ready<(UserId, Result<DeliveryOutcome, AppError>)>> =
            Vec::new();
        let report = FanOutReport::collect(tasks).await;
        assert_eq!(report.targets, 0);
        assert!(report.failed.is_empty());
    }
}
