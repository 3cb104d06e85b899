use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::UserId;

#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: SessionId,
    pub user_id: UserId,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(user_id: UserId, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            user_id,
            title,
            created_at: now,
            last_activity_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
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

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}
