use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{LabResult, UserId};

use super::RepositoryError;

#[async_trait]
pub trait LabResultRepository: Send + Sync {
    /// Insert one result. A duplicate (user, test name, recorded date)
    /// returns `ConstraintViolation` and persists nothing for that row.
    async fn insert(&self, result: &LabResult) -> Result<(), RepositoryError>;

    /// Results on or after `cutoff`, newest first, optional case-insensitive
    /// partial test-name filter.
    async fn list_recent(
        &self,
        user_id: UserId,
        cutoff: NaiveDate,
        test_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<LabResult>, RepositoryError>;

    /// All results matching a test-name fragment on or after `cutoff`,
    /// oldest first (trend order).
    async fn list_for_test(
        &self,
        user_id: UserId,
        test_name: &str,
        cutoff: NaiveDate,
    ) -> Result<Vec<LabResult>, RepositoryError>;

    async fn list_on(&self, user_id: UserId, date: NaiveDate)
        -> Result<Vec<LabResult>, RepositoryError>;
}
