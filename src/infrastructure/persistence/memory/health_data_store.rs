use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::application::ports::{RepositoryError, SymptomRepository, WearableRepository};
use crate::domain::{EventCategory, HealthEvent, SeriesDefinition, SeriesSample, SymptomEntry, UserId};

/// In-memory symptom log and wearable store, seedable for tests and local
/// runs.
#[derive(Default)]
pub struct InMemoryHealthDataStore {
    symptoms: Mutex<Vec<SymptomEntry>>,
    series: Mutex<Vec<SeriesDefinition>>,
    samples: Mutex<Vec<SeriesSample>>,
    events: Mutex<Vec<HealthEvent>>,
}

impl InMemoryHealthDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_symptom(&self, entry: SymptomEntry) {
        self.symptoms.lock().await.push(entry);
    }

    pub async fn add_series_definition(&self, code: &str, unit: &str) {
        self.series.lock().await.push(SeriesDefinition {
            code: code.to_string(),
            unit: unit.to_string(),
        });
    }

    pub async fn add_sample(
        &self,
        user_id: UserId,
        code: &str,
        value: f64,
        recorded_at: DateTime<Utc>,
    ) {
        self.samples.lock().await.push(SeriesSample {
            user_id,
            code: code.to_string(),
            value,
            recorded_at,
        });
    }

    pub async fn add_event(&self, event: HealthEvent) {
        self.events.lock().await.push(event);
    }
}

#[async_trait]
impl SymptomRepository for InMemoryHealthDataStore {
    async fn list_since(
        &self,
        user_id: UserId,
        cutoff: DateTime<Utc>,
        symptom_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SymptomEntry>, RepositoryError> {
        let symptoms = self.symptoms.lock().await;
        let mut matching: Vec<SymptomEntry> = symptoms
            .iter()
            .filter(|s| s.user_id == user_id && s.recorded_at >= cutoff)
            .filter(|s| symptom_type.is_none_or(|t| s.symptom_type == t))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn list_between(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SymptomEntry>, RepositoryError> {
        let symptoms = self.symptoms.lock().await;
        Ok(symptoms
            .iter()
            .filter(|s| s.user_id == user_id && s.recorded_at >= start && s.recorded_at < end)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WearableRepository for InMemoryHealthDataStore {
    async fn series_definitions(&self) -> Result<Vec<SeriesDefinition>, RepositoryError> {
        let mut definitions = self.series.lock().await.clone();
        definitions.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(definitions)
    }

    async fn samples_since(
        &self,
        user_id: UserId,
        code: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<SeriesSample>, RepositoryError> {
        let samples = self.samples.lock().await;
        let mut matching: Vec<SeriesSample> = samples
            .iter()
            .filter(|s| s.user_id == user_id && s.code == code && s.recorded_at >= cutoff)
            .cloned()
            .collect();
        matching.sort_by_key(|s| s.recorded_at);
        Ok(matching)
    }

    async fn samples_between(
        &self,
        user_id: UserId,
        code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SeriesSample>, RepositoryError> {
        let samples = self.samples.lock().await;
        let mut matching: Vec<SeriesSample> = samples
            .iter()
            .filter(|s| {
                s.user_id == user_id
                    && s.code == code
                    && s.recorded_at >= start
                    && s.recorded_at < end
            })
            .cloned()
            .collect();
        matching.sort_by_key(|s| s.recorded_at);
        Ok(matching)
    }

    async fn events_between(
        &self,
        user_id: UserId,
        category: EventCategory,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HealthEvent>, RepositoryError> {
        let events = self.events.lock().await;
        let mut matching: Vec<HealthEvent> = events
            .iter()
            .filter(|e| {
                e.user_id == user_id
                    && e.category == category
                    && e.start_at < end
                    && e.end_at >= start
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.start_at.cmp(&a.start_at));
        Ok(matching)
    }
}
