use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ChatMessage, ChatSession, SessionId, UserId};

use super::RepositoryError;

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn create_session(&self, session: &ChatSession) -> Result<(), RepositoryError>;

    async fn get_session(&self, id: SessionId) -> Result<Option<ChatSession>, RepositoryError>;

    async fn list_sessions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<ChatSession>, RepositoryError>;

    /// Delete a session and its messages. Returns false when unknown.
    async fn delete_session(&self, id: SessionId) -> Result<bool, RepositoryError>;

    async fn append_message(&self, message: &ChatMessage) -> Result<(), RepositoryError>;

    /// Messages oldest first.
    async fn list_messages(
        &self,
        session_id: SessionId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;

    /// Bump last-activity. Must keep the timestamp monotonically
    /// non-decreasing.
    async fn touch_session(&self, id: SessionId, at: DateTime<Utc>)
        -> Result<(), RepositoryError>;

    async fn set_title(&self, id: SessionId, title: &str) -> Result<(), RepositoryError>;
}
