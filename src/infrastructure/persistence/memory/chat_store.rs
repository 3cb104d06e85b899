use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::application::ports::{ChatRepository, RepositoryError};
use crate::domain::{ChatMessage, ChatSession, SessionId, UserId};

/// In-memory chat adapter: sessions plus their append-only message log.
#[derive(Default)]
pub struct InMemoryChatStore {
    sessions: Mutex<Vec<ChatSession>>,
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatStore {
    async fn create_session(&self, session: &ChatSession) -> Result<(), RepositoryError> {
        self.sessions.lock().await.push(session.clone());
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self
            .sessions
            .lock()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn list_sessions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let sessions = self.sessions.lock().await;
        let mut matching: Vec<ChatSession> = sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn delete_session(&self, id: SessionId) -> Result<bool, RepositoryError> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        let deleted = sessions.len() < before;
        if deleted {
            self.messages.lock().await.retain(|m| m.session_id != id);
        }
        Ok(deleted)
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        self.messages.lock().await.push(message.clone());
        Ok(())
    }

    async fn list_messages(
        &self,
        session_id: SessionId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        let mut matching: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.created_at);
        // Most recent window, still oldest-first.
        if matching.len() > limit {
            matching.drain(..matching.len() - limit);
        }
        Ok(matching)
    }

    async fn touch_session(
        &self,
        id: SessionId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("chat session {}", id.as_uuid())))?;
        // Monotonically non-decreasing.
        if at > session.last_activity_at {
            session.last_activity_at = at;
        }
        Ok(())
    }

    async fn set_title(&self, id: SessionId, title: &str) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("chat session {}", id.as_uuid())))?;
        session.title = Some(title.to_string());
        Ok(())
    }
}
