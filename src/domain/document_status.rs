use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    Pending,
    Parsing,
    Parsed,
    Extracting,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Parsing => "parsing",
            DocumentStatus::Parsed => "parsed",
            DocumentStatus::Extracting => "extracting",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Failed)
    }

    /// Legal transitions: the forward path pending → parsing → parsed →
    /// extracting → completed, plus a divert to failed from any
    /// non-terminal state.
    pub fn can_advance_to(&self, next: DocumentStatus) -> bool {
        if next == DocumentStatus::Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (DocumentStatus::Pending, DocumentStatus::Parsing)
                | (DocumentStatus::Parsing, DocumentStatus::Parsed)
                | (DocumentStatus::Parsed, DocumentStatus::Extracting)
                | (DocumentStatus::Extracting, DocumentStatus::Completed)
        )
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DocumentStatus::Pending),
            "parsing" => Ok(DocumentStatus::Parsing),
            "parsed" => Ok(DocumentStatus::Parsed),
            "extracting" => Ok(DocumentStatus::Extracting),
            "completed" => Ok(DocumentStatus::Completed),
            "failed" => Ok(DocumentStatus::Failed),
            _ => Err(format!("Invalid document status: {}", s)),
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
