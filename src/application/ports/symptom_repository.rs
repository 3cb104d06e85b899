use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{SymptomEntry, UserId};

use super::RepositoryError;

#[async_trait]
pub trait SymptomRepository: Send + Sync {
    /// Entries on or after `cutoff`, newest first, optional exact type
    /// filter.
    async fn list_since(
        &self,
        user_id: UserId,
        cutoff: DateTime<Utc>,
        symptom_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SymptomEntry>, RepositoryError>;

    async fn list_between(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SymptomEntry>, RepositoryError>;
}
