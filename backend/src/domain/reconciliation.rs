//! Background sweep removing pictures whose owner no longer exists.
//!
//! A picture write that timed out may land after the registration was rolled
//! back. The sweep finds such orphans and deletes them.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::{PictureStore, UserRepository};
use crate::domain::{Error, Idempotency, StorageRetry, UserId};

/// Counters describing one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Distinct picture owners inspected.
    pub scanned: usize,
    /// Orphaned pictures deleted.
    pub removed: usize,
    /// Orphaned pictures that could not be deleted this time.
    pub failed: usize,
}

/// Deletes pictures that reference missing users.
#[derive(Clone)]
pub struct PictureReconciler {
    users: Arc<dyn UserRepository>,
    pictures: Arc<dyn PictureStore>,
    retry: StorageRetry,
}

impl PictureReconciler {
    /// Reconciler over the same stores the registration flow writes to.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        pictures: Arc<dyn PictureStore>,
        retry: StorageRetry,
    ) -> Self {
        Self {
            users,
            pictures,
            retry,
        }
    }

    /// Run one sweep.
    ///
    /// Deletion failures are counted, not returned; the next sweep retries
    /// them.
    pub async fn sweep(&self) -> Result<ReconciliationReport, Error> {
        let users = &self.users;
        let pictures = &self.pictures;

        let owners = self
            .retry
            .run("pictures.owner_ids", Idempotency::Idempotent, move || {
                pictures.owner_ids()
            })
            .await
            .map_err(|failure| failure.into_domain_error(|err| Error::internal(err.to_string())))?;
        if owners.is_empty() {
            return Ok(ReconciliationReport::default());
        }

        let candidates = owners.as_slice();
        let existing: HashSet<UserId> = self
            .retry
            .run("users.existing_ids", Idempotency::Idempotent, move || {
                users.existing_ids(candidates)
            })
            .await
            .map_err(|failure| failure.into_domain_error(|err| Error::internal(err.to_string())))?
            .into_iter()
            .collect();

        let mut report = ReconciliationReport {
            scanned: owners.len(),
            ..ReconciliationReport::default()
        };
        for orphan in owners.iter().filter(|owner| !existing.contains(*owner)) {
            match self
                .retry
                .run("pictures.delete_by_user", Idempotency::Idempotent, move || {
                    pictures.delete_by_user(orphan)
                })
                .await
            {
                Ok(_) => {
                    info!(user_id = %orphan, "removed orphaned profile picture");
                    report.removed += 1;
                }
                Err(failure) => {
                    warn!(user_id = %orphan, error = %failure, "failed to remove orphaned profile picture");
                    report.failed += 1;
                }
            }
        }

        info!(
            scanned = report.scanned,
            removed = report.removed,
            failed = report.failed,
            "picture reconciliation finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mockall::predicate::eq;
    use rstest::rstest;

    use crate::domain::ports::{MockPictureStore, MockUserRepository, PictureStoreError};
    use crate::domain::{ErrorCode, RetryPolicy, RetryRuntime, RetrySleeper};

    struct NoSleep;

    #[async_trait::async_trait]
    impl RetrySleeper for NoSleep {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn retry() -> StorageRetry {
        StorageRetry::with_runtime(
            RetryPolicy {
                max_attempts: 1,
                ..RetryPolicy::default()
            },
            RetryRuntime {
                sleeper: Arc::new(NoSleep),
                ..RetryRuntime::default()
            },
        )
    }

    fn id(raw: i64) -> UserId {
        UserId::new(raw).expect("user id")
    }

    #[rstest]
    #[tokio::test]
    async fn deletes_only_orphans() {
        let mut pictures = MockPictureStore::new();
        pictures
            .expect_owner_ids()
            .returning(|| Ok(vec![id(1), id(2), id(3)]));
        pictures
            .expect_delete_by_user()
            .with(eq(id(2)))
            .times(1)
            .returning(|_| Ok(true));
        let mut users = MockUserRepository::new();
        users
            .expect_existing_ids()
            .returning(|_| Ok(vec![id(1), id(3)]));

        let report = PictureReconciler::new(Arc::new(users), Arc::new(pictures), retry())
            .sweep()
            .await
            .expect("sweep");

        assert_eq!(
            report,
            ReconciliationReport {
                scanned: 3,
                removed: 1,
                failed: 0
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn empty_store_skips_user_lookup() {
        let mut pictures = MockPictureStore::new();
        pictures.expect_owner_ids().returning(|| Ok(Vec::new()));
        let mut users = MockUserRepository::new();
        users.expect_existing_ids().never();

        let report = PictureReconciler::new(Arc::new(users), Arc::new(pictures), retry())
            .sweep()
            .await
            .expect("sweep");
        assert_eq!(report, ReconciliationReport::default());
    }

    #[rstest]
    #[tokio::test]
    async fn failed_deletions_are_counted() {
        let mut pictures = MockPictureStore::new();
        pictures.expect_owner_ids().returning(|| Ok(vec![id(4)]));
        pictures
            .expect_delete_by_user()
            .returning(|_| Err(PictureStoreError::connection("refused")));
        let mut users = MockUserRepository::new();
        users.expect_existing_ids().returning(|_| Ok(Vec::new()));

        let report = PictureReconciler::new(Arc::new(users), Arc::new(pictures), retry())
            .sweep()
            .await
            .expect("sweep");
        assert_eq!(report.failed, 1);
        assert_eq!(report.removed, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn unreachable_picture_store_fails_the_sweep() {
        let mut pictures = MockPictureStore::new();
        pictures
            .expect_owner_ids()
            .returning(|| Err(PictureStoreError::connection("refused")));

        let err = PictureReconciler::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(pictures),
            retry(),
        )
        .sweep()
        .await
        .expect_err("unavailable");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
