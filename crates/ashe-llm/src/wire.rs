//! Wire types for the chat-completion endpoint.
//!
//! Request fields are snake_case on the wire. The response parser keeps
//! only what the pipeline consumes (`choices[last].message.content` plus
//! the usage block) and ignores every unknown field.

use serde::{Deserialize, Serialize};

/// One `{role, content}` pair in the messages array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Completion request body
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub messages: Vec<Message>,
}

impl CompletionRequest {
    /// Build a request with the pipeline's sampling defaults: low
    /// temperature, bounded output, neutral penalties.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.2,
            max_tokens: 1000,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            messages,
        }
    }
}

/// Completion reply body (unknown fields ignored)
#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Content of the last choice, the one the pipeline consumes.
    pub fn last_content(self) -> Option<String> {
        self.choices.into_iter().next_back().map(|c| c.message.content)
    }
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub index: Option<u32>,
    pub message: Message,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

// ============================================================================
// Tests
// ============================================================================
