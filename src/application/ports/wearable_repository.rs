use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{EventCategory, HealthEvent, SeriesDefinition, SeriesSample, UserId};

use super::RepositoryError;

#[async_trait]
pub trait WearableRepository: Send + Sync {
    /// The series catalog, sorted by code.
    async fn series_definitions(&self) -> Result<Vec<SeriesDefinition>, RepositoryError>;

    /// Samples of one series on or after `cutoff`, in recording order.
    async fn samples_since(
        &self,
        user_id: UserId,
        code: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<SeriesSample>, RepositoryError>;

    async fn samples_between(
        &self,
        user_id: UserId,
        code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SeriesSample>, RepositoryError>;

    /// Events of one category whose [start, end] intersects the window,
    /// newest first.
    async fn events_between(
        &self,
        user_id: UserId,
        category: EventCategory,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HealthEvent>, RepositoryError>;
}
