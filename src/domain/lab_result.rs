use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{DocumentId, UserId};

/// A single structured lab measurement. `document_id` is None for manually
/// entered results. (user_id, test_name, recorded_at) is unique.
#[derive(Debug, Clone)]
pub struct LabResult {
    pub id: LabResultId,
    pub document_id: Option<DocumentId>,
    pub user_id: UserId,
    pub test_name: String,
    pub test_code: Option<String>,
    pub value: Decimal,
    pub unit: String,
    pub reference_min: Option<Decimal>,
    pub reference_max: Option<Decimal>,
    pub status: Option<LabStatus>,
    pub recorded_at: NaiveDate,
}

impl LabResult {
    /// Status as read paths should report it: recomputed from the reference
    /// range when one exists, persisted value otherwise.
    pub fn effective_status(&self) -> Option<LabStatus> {
        LabStatus::classify(self.value, self.reference_min, self.reference_max).or(self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabResultId(Uuid);

impl LabResultId {
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

impl Default for LabResultId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabStatus {
    Normal,
    High,
    Low,
}

impl LabStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabStatus::Normal => "normal",
            LabStatus::High => "high",
            LabStatus::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(LabStatus::Normal),
            "high" => Some(LabStatus::High),
            "low" => Some(LabStatus::Low),
            _ => None,
        }
    }

    /// Classify a value against a reference range. Bounds are inclusive: a
    /// value exactly at reference_min or reference_max is normal. Returns
    /// None when no bound is available.
    pub fn classify(
        value: Decimal,
        reference_min: Option<Decimal>,
        reference_max: Option<Decimal>,
    ) -> Option<Self> {
        match (reference_min, reference_max) {
            (None, None) => None,
            (min, max) => {
                if min.is_some_and(|m| value < m) {
                    Some(LabStatus::Low)
                } else if max.is_some_and(|m| value > m) {
                    Some(LabStatus::High)
                } else {
                    Some(LabStatus::Normal)
                }
            }
        }
    }
}
