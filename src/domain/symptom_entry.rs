use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::UserId;

/// A user-logged symptom occurrence. Severity is on a 0-10 scale.
#[derive(Debug, Clone)]
pub struct SymptomEntry {
    pub id: SymptomEntryId,
    pub user_id: UserId,
    pub symptom_type: String,
    pub severity: i32,
    pub notes: Option<String>,
    pub triggers: Option<Vec<String>>,
    pub duration_minutes: Option<i64>,
    pub recorded_at: DateTime<Utc>,
}

impl SymptomEntry {
    pub fn new(
        user_id: UserId,
        symptom_type: String,
        severity: i32,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SymptomEntryId::new(),
            user_id,
            symptom_type,
            severity,
            notes: None,
            triggers: None,
            duration_minutes: None,
            recorded_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymptomEntryId(Uuid);

impl SymptomEntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SymptomEntryId {
    fn default() -> Self {
        Self::new()
    }
}
