use std::sync::Arc;

use chrono::Utc;
use futures::stream::StreamExt;
use serde_json::json;
use uuid::Uuid;

use crate::application::ports::{
    ChatRepository, LabResultRepository, ProviderClient, ProviderMessage, RepositoryError,
    SymptomRepository, WearableRepository, WireRole,
};
use crate::application::tools::{health_tool_definitions, ToolDispatcher, ToolExecutor};
use crate::domain::{ChatMessage, ChatSession, MessageRole, SessionId, UserId};

use super::chat_orchestrator::{ChatEvent, ChatEventStream, ChatOrchestrator};

const HISTORY_LIMIT: usize = 50;
const SESSION_LIST_LIMIT: usize = 50;
const TITLE_MAX_CHARS: usize = 50;

const SYSTEM_PROMPT: &str = "You are a knowledgeable and empathetic health assistant. You help \
users understand their health data from wearable devices, lab results, and symptom tracking.\n\n\
## Your Capabilities\n\
You have access to tools that can query:\n\
- **Lab Results**: Blood tests, hormone levels, medical markers with reference ranges\n\
- **Symptom History**: User-logged symptoms with severity, triggers, and duration\n\
- **Wearable Data**: Heart rate, steps, sleep, workouts, HRV, weight, and more\n\
- **Daily Summaries**: Combined view of all health data for a specific date\n\
- **Correlations**: Statistical relationships between any two health metrics\n\n\
## Guidelines\n\
1. **Always use tools** to look up real data before answering. Never guess or make up data.\n\
2. **Be specific**: Include actual numbers, dates, and trends.\n\
3. **Highlight important findings**: Flag values outside reference ranges.\n\
4. **Be honest about limitations**: You are not a doctor. Always recommend consulting a \
healthcare professional for medical decisions.\n\
5. **Privacy-first**: All data is stored locally. No data leaves the user's infrastructure.\n\
6. **Be concise but thorough**: Provide clear answers without unnecessary verbosity.\n\n\
## Safety Disclaimer\n\
You provide health data analysis and insights, NOT medical advice. Always recommend consulting \
a healthcare professional for:\n\
- Diagnosis or treatment decisions\n\
- Medication changes\n\
- Concerning symptoms or trends\n\
- Values significantly outside reference ranges\n\n\
## Date Awareness\n\
Today's date is {today}. Use this to calculate relative time periods (e.g., 'last week', \
'past month').";

/// Session management plus the side effects around the tool-calling loop:
/// the user message is committed before the loop starts, the assistant
/// message only after the loop reaches `done`.
pub struct ChatService<P: ProviderClient + ?Sized> {
    orchestrator: ChatOrchestrator<P>,
    chat_repository: Arc<dyn ChatRepository>,
    lab_repository: Arc<dyn LabResultRepository>,
    symptom_repository: Arc<dyn SymptomRepository>,
    wearable_repository: Arc<dyn WearableRepository>,
}

impl<P: ProviderClient + ?Sized + 'static> ChatService<P> {
    pub fn new(
        provider: Arc<P>,
        chat_repository: Arc<dyn ChatRepository>,
        lab_repository: Arc<dyn LabResultRepository>,
        symptom_repository: Arc<dyn SymptomRepository>,
        wearable_repository: Arc<dyn WearableRepository>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            orchestrator: ChatOrchestrator::new(provider).with_max_tool_rounds(max_tool_rounds),
            chat_repository,
            lab_repository,
            symptom_repository,
            wearable_repository,
        }
    }

    pub async fn create_session(
        &self,
        user_id: UserId,
        title: Option<String>,
    ) -> Result<ChatSession, ChatServiceError> {
        let session = ChatSession::new(user_id, title);
        self.chat_repository.create_session(&session).await?;
        tracing::info!(
            session_id = %session.id.as_uuid(),
            user_id = %user_id.as_uuid(),
            "Created chat session"
        );
        Ok(session)
    }

    pub async fn get_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<ChatSession>, ChatServiceError> {
        Ok(self.chat_repository.get_session(session_id).await?)
    }

    pub async fn list_sessions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ChatSession>, ChatServiceError> {
        Ok(self
            .chat_repository
            .list_sessions(user_id, SESSION_LIST_LIMIT)
            .await?)
    }

    pub async fn delete_session(&self, session_id: SessionId) -> Result<bool, ChatServiceError> {
        Ok(self.chat_repository.delete_session(session_id).await?)
    }

    pub async fn list_messages(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<ChatMessage>, ChatServiceError> {
        Ok(self
            .chat_repository
            .list_messages(session_id, usize::MAX)
            .await?)
    }

    /// Persist the user's message, then run the tool-calling loop, emitting
    /// the normalized event stream. The assistant's reply is persisted only
    /// when the loop reaches `done`; an abandoned or errored stream loses it.
    pub async fn send_message_stream(
        &self,
        session_id: SessionId,
        content: String,
    ) -> Result<ChatEventStream, ChatServiceError> {
        let session = self
            .chat_repository
            .get_session(session_id)
            .await?
            .ok_or(ChatServiceError::SessionNotFound(session_id.as_uuid()))?;
        let user_id = session.user_id;

        let user_message = ChatMessage::new(session_id, MessageRole::User, content.clone());
        self.chat_repository.append_message(&user_message).await?;
        self.chat_repository
            .touch_session(session_id, Utc::now())
            .await?;

        let conversation = self.build_conversation(session_id).await?;

        let executor: Arc<dyn ToolExecutor> = Arc::new(ToolDispatcher::new(
            Arc::clone(&self.lab_repository),
            Arc::clone(&self.symptom_repository),
            Arc::clone(&self.wearable_repository),
            user_id,
        ));

        let inner = self
            .orchestrator
            .run(conversation, health_tool_definitions(), executor);

        let chat_repository = Arc::clone(&self.chat_repository);
        let needs_title = session.title.is_none();

        let stream = async_stream::stream! {
            let mut inner = inner;
            let mut content_parts: Vec<String> = Vec::new();
            let mut invoked_tools: Vec<serde_json::Value> = Vec::new();

            while let Some(event) = inner.next().await {
                match &event {
                    ChatEvent::Content { content } => {
                        content_parts.push(content.clone());
                    }
                    ChatEvent::ToolCall { name, arguments } => {
                        invoked_tools.push(json!({ "tool": name, "arguments": arguments }));
                    }
                    // Committed before the terminal event is yielded.
                    ChatEvent::Done => {
                        let full_content = content_parts.concat();
                        if !full_content.trim().is_empty() {
                            let mut assistant =
                                ChatMessage::new(session_id, MessageRole::Assistant, full_content);
                            if !invoked_tools.is_empty() {
                                assistant = assistant
                                    .with_metadata(json!({ "tool_calls": invoked_tools }));
                            }
                            if let Err(e) = chat_repository.append_message(&assistant).await {
                                tracing::error!(error = %e, "Failed to persist assistant message");
                            }
                            if let Err(e) =
                                chat_repository.touch_session(session_id, Utc::now()).await
                            {
                                tracing::error!(error = %e, "Failed to bump session activity");
                            }
                        }

                        if needs_title {
                            let title = derive_title(&content);
                            if let Err(e) = chat_repository.set_title(session_id, &title).await {
                                tracing::error!(error = %e, "Failed to set session title");
                            }
                        }
                    }
                    ChatEvent::Error { error } => {
                        tracing::error!(error = %error, "Chat loop ended with error");
                    }
                    ChatEvent::ToolResult { .. } => {}
                }

                let terminal = matches!(event, ChatEvent::Done | ChatEvent::Error { .. });
                yield event;
                if terminal {
                    return;
                }
            }
        };

        Ok(Box::pin(stream))
    }

    /// System prompt carrying today's date, then the stored history.
    async fn build_conversation(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<ProviderMessage>, ChatServiceError> {
        let today = Utc::now().date_naive().to_string();
        let mut conversation = vec![ProviderMessage::system(
            SYSTEM_PROMPT.replace("{today}", &today),
        )];

        let history = self
            .chat_repository
            .list_messages(session_id, HISTORY_LIMIT)
            .await?;
        for message in history {
            let role = match message.role {
                MessageRole::User => WireRole::User,
                MessageRole::Assistant => WireRole::Assistant,
                MessageRole::Tool => WireRole::Tool,
            };
            conversation.push(ProviderMessage {
                role,
                content: message.content,
                tool_calls: Vec::new(),
                tool_call_id: None,
            });
        }

        Ok(conversation)
    }
}

/// First ~50 characters of the user's message, char-safe, with an ellipsis
/// marker when truncated.
fn derive_title(content: &str) -> String {
    let mut title: String = content.chars().take(TITLE_MAX_CHARS).collect();
    title = title.trim().to_string();
    if content.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

#[derive(Debug, thiserror::Error)]
pub enum ChatServiceError {
    #[error("chat session not found: {0}")]
    SessionNotFound(Uuid),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
