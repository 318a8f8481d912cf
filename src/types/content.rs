//! Content generation types (caller-facing shape)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A turn of conversation. Parts are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<serde_json::Value>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self::text("user", text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::text("model", text)
    }

    fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![serde_json::json!({ "text": text.into() })],
        }
    }
}

/// Parameters of `generateContent` / `streamGenerateContent`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateContentParams {
    pub model: String,
    pub contents: Vec<Content>,
    pub system_instruction: Option<Content>,
    pub cached_content: Option<String>,
    pub tools: Vec<serde_json::Value>,
    pub tool_config: Option<serde_json::Value>,
    pub safety_settings: Vec<serde_json::Value>,
    pub generation_config: Option<serde_json::Value>,
    pub labels: HashMap<String, String>,
}

impl GenerateContentParams {
    pub fn new(model: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            model: model.into(),
            contents,
            ..Self::default()
        }
    }

    pub fn with_system_instruction(mut self, instruction: Content) -> Self {
        self.system_instruction = Some(instruction);
        self
    }

    pub fn with_generation_config(mut self, config: serde_json::Value) -> Self {
        self.generation_config = Some(config);
        self
    }

    pub fn with_tools(mut self, tools: Vec<serde_json::Value>) -> Self {
        self.tools = tools;
        self
    }
}

/// A generated response, or one chunk of a streamed response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automatic_function_calling_history: Option<Vec<Content>>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = self
            .candidates
            .first()?
            .get("content")?
            .get("parts")?
            .as_array()?;
        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Parameters of `countTokens`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountTokensParams {
    pub model: String,
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountTokensResponse {
    pub total_tokens: u64,
}
