use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::application::ports::{LabResultRepository, RepositoryError};
use crate::domain::{LabResult, UserId};

/// In-memory lab-result adapter enforcing the (user, test name, recorded
/// date) uniqueness constraint.
#[derive(Default)]
pub struct InMemoryLabStore {
    results: Mutex<Vec<LabResult>>,
}

impl InMemoryLabStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.results.lock().await.len()
    }
}

fn name_matches(haystack: &str, fragment: &str) -> bool {
    haystack.to_lowercase().contains(&fragment.to_lowercase())
}

#[async_trait]
impl LabResultRepository for InMemoryLabStore {
    async fn insert(&self, result: &LabResult) -> Result<(), RepositoryError> {
        let mut results = self.results.lock().await;
        let duplicate = results.iter().any(|r| {
            r.user_id == result.user_id
                && r.test_name == result.test_name
                && r.recorded_at == result.recorded_at
        });
        if duplicate {
            return Err(RepositoryError::ConstraintViolation(format!(
                "lab_result user={} test={} date={}",
                result.user_id.as_uuid(),
                result.test_name,
                result.recorded_at
            )));
        }
        results.push(result.clone());
        Ok(())
    }

    async fn list_recent(
        &self,
        user_id: UserId,
        cutoff: NaiveDate,
        test_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<LabResult>, RepositoryError> {
        let results = self.results.lock().await;
        let mut matching: Vec<LabResult> = results
            .iter()
            .filter(|r| r.user_id == user_id && r.recorded_at >= cutoff)
            .filter(|r| test_name.is_none_or(|name| name_matches(&r.test_name, name)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then_with(|| a.test_name.cmp(&b.test_name))
        });
        matching.truncate(limit);
        Ok(matching)
    }

    async fn list_for_test(
        &self,
        user_id: UserId,
        test_name: &str,
        cutoff: NaiveDate,
    ) -> Result<Vec<LabResult>, RepositoryError> {
        let results = self.results.lock().await;
        let mut matching: Vec<LabResult> = results
            .iter()
            .filter(|r| {
                r.user_id == user_id
                    && r.recorded_at >= cutoff
                    && name_matches(&r.test_name, test_name)
            })
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.recorded_at);
        Ok(matching)
    }

    async fn list_on(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<LabResult>, RepositoryError> {
        let results = self.results.lock().await;
        Ok(results
            .iter()
            .filter(|r| r.user_id == user_id && r.recorded_at == date)
            .cloned()
            .collect())
    }
}
