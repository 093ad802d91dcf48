/// Conversational game assistant
///
/// Answers free-form gaming questions through an OpenAI-compatible Chat
/// Completions API, sending a persona prompt plus the most recent turns of
/// conversation history. Provider failures never propagate: the caller gets a
/// fixed fallback answer and the error is logged.

use serde::{Deserialize, Serialize};

use crate::config::AssistantConfig;
use crate::errors::GameFinderError;

const SYSTEM_PROMPT: &str = "You are GameFinder AI, a friendly, knowledgeable gaming assistant.\n\
     You:\n\
     - Remember recent conversation context\n\
     - Help with game recommendations, specs, comparisons, and opinions\n\
     - Speak like a gamer, but stay helpful and concise\n\
     - Ask follow-up questions when useful";

/// Answer returned when the chat provider fails.
pub const FALLBACK_ANSWER: &str = "My neural circuits are overheating. Try again in a moment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    #[serde(other)]
    Other,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        ChatMessage { role, content: content.into() }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Build the message list: persona, last `window` user/assistant turns, new message.
///
/// The window is applied before filtering, so system or unknown-role turns
/// inside it are dropped rather than replaced by older turns.
pub fn build_messages(history: &[ChatMessage], user_message: &str, window: usize) -> Vec<ChatMessage> {
    let start = history.len().saturating_sub(window);
    let mut messages = vec![ChatMessage::new(Role::System, SYSTEM_PROMPT)];
    messages.extend(
        history[start..]
            .iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant))
            .cloned(),
    );
    messages.push(ChatMessage::new(Role::User, user_message));
    messages
}

pub struct GameAssistant {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    config: AssistantConfig,
}

impl GameAssistant {
    /// # Errors
    /// Returns `GameFinderError::Config` if no API key is configured.
    pub fn new(config: &AssistantConfig) -> Result<Self, GameFinderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                GameFinderError::Config(
                    "Assistant API key required. \
                     Set GAMEFINDER_ASSISTANT__API_KEY or assistant.api_key in gamefinder.toml"
                        .to_string(),
                )
            })?;

        Ok(GameAssistant {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            config: config.clone(),
        })
    }

    /// Answer a message given prior history. Never fails.
    pub async fn answer(&self, user_message: &str, history: &[ChatMessage]) -> String {
        let messages = build_messages(history, user_message, self.config.history_window);
        match self.complete(&messages).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(model = %self.config.model, error = %e, "Assistant chat failed");
                FALLBACK_ANSWER.to_string()
            }
        }
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, GameFinderError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| GameFinderError::Internal(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GameFinderError::Internal(format!("API error (status {}): {}", status, body)));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| GameFinderError::Internal(format!("Failed to parse chat response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| GameFinderError::Internal("API returned empty choices list".to_string()))
    }
}
