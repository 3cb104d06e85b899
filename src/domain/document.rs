use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{DocumentStatus, UserId};

#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub user_id: UserId,
    pub title: String,
    pub document_type: DocumentType,
    pub file_path: String,
    pub file_type: String,
    pub raw_text: Option<String>,
    pub parsed_data: Option<serde_json::Value>,
    pub document_date: Option<NaiveDate>,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        user_id: UserId,
        title: String,
        document_type: DocumentType,
        file_path: String,
        file_type: String,
        document_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            user_id,
            title,
            document_type,
            file_path,
            file_type,
            raw_text: None,
            parsed_data: None,
            document_date,
            status: DocumentStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(Uuid);

impl DocumentId {
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

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    LabReport,
    Prescription,
    Imaging,
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::LabReport => "lab_report",
            DocumentType::Prescription => "prescription",
            DocumentType::Imaging => "imaging",
            DocumentType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lab_report" => Some(DocumentType::LabReport),
            "prescription" => Some(DocumentType::Prescription),
            "imaging" => Some(DocumentType::Imaging),
            "other" => Some(DocumentType::Other),
            _ => None,
        }
    }
}
