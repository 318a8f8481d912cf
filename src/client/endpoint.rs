//! Endpoint resolution

use crate::config::{CODE_ASSIST_API_VERSION, CODE_ASSIST_ENDPOINT};

use super::core::CodeAssistClient;

/// `{base}/{version}:{method}`
pub fn method_url(base: &str, method: &str) -> String {
    format!("{}/{}:{}", base, CODE_ASSIST_API_VERSION, method)
}

/// `{base}/{version}/{name}`, for long-running operation names such as `operations/123`.
pub fn operation_url(base: &str, name: &str) -> String {
    format!("{}/{}/{}", base, CODE_ASSIST_API_VERSION, name)
}

pub trait EndpointExt {
    /// The configured override, or [`CODE_ASSIST_ENDPOINT`]. Read on every call.
    fn base_endpoint(&self) -> String;

    fn method_url(&self, method: &str) -> String {
        method_url(&self.base_endpoint(), method)
    }

    fn operation_url(&self, name: &str) -> String {
        operation_url(&self.base_endpoint(), name)
    }
}

impl EndpointExt for CodeAssistClient {
    fn base_endpoint(&self) -> String {
        self.config
            .endpoint_override
            .endpoint_override()
            .unwrap_or_else(|| CODE_ASSIST_ENDPOINT.to_string())
    }
}
