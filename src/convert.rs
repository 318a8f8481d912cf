//! Request/response converters between the caller-facing types and the wire shape.
//!
//! Content calls are wrapped in a `{model, project, user_prompt_id, request}`
//! envelope; responses come back as `{response: {...}}`.

use crate::types::{
    Content, CountTokensParams, CountTokensResponse, GenerateContentParams,
    GenerateContentResponse,
};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexGenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub safety_settings: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<serde_json::Value>,
    #[serde(rename = "session_id", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Wire body of `generateContent` and `streamGenerateContent`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaGenerateContentRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub user_prompt_id: String,
    pub request: VertexGenerateContentRequest,
}

#[derive(Debug, Deserialize)]
struct CaGenerateContentResponse {
    #[serde(default)]
    response: Option<GenerateContentResponse>,
}

pub fn to_generate_content_request(
    params: &GenerateContentParams,
    user_prompt_id: &str,
    project: Option<&str>,
    session_id: Option<&str>,
) -> Result<serde_json::Value> {
    let wire = CaGenerateContentRequest {
        model: params.model.clone(),
        project: project.map(str::to_string),
        user_prompt_id: user_prompt_id.to_string(),
        request: VertexGenerateContentRequest {
            contents: params.contents.clone(),
            system_instruction: params.system_instruction.clone(),
            cached_content: params.cached_content.clone(),
            tools: params.tools.clone(),
            tool_config: params.tool_config.clone(),
            labels: params.labels.clone(),
            safety_settings: params.safety_settings.clone(),
            generation_config: params.generation_config.clone(),
            session_id: session_id.map(str::to_string),
        },
    };
    Ok(serde_json::to_value(wire)?)
}

/// Unwrap `{response: ...}`. A missing `response` yields an empty response.
pub fn from_generate_content_response(value: serde_json::Value) -> Result<GenerateContentResponse> {
    let wire: CaGenerateContentResponse = serde_json::from_value(value)?;
    Ok(wire.response.unwrap_or_default())
}

pub fn to_count_tokens_request(params: &CountTokensParams) -> Result<serde_json::Value> {
    Ok(serde_json::json!({
        "request": {
            "model": format!("models/{}", params.model),
            "contents": params.contents,
        }
    }))
}

pub fn from_count_tokens_response(value: serde_json::Value) -> Result<CountTokensResponse> {
    Ok(serde_json::from_value(value)?)
}
