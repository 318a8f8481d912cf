//! Typed Code Assist operations built on the dispatcher.

use crate::convert;
use crate::types::{
    CodeAssistGlobalUserSettingResponse, CountTokensParams, CountTokensResponse,
    GenerateContentParams, GenerateContentResponse, LoadCodeAssistRequest,
    LoadCodeAssistResponse, LongRunningOperation, OnboardUserRequest, RetrieveUserQuotaRequest,
    RetrieveUserQuotaResponse, SetCodeAssistGlobalUserSettingRequest,
};
use crate::{BoxStream, Error, Result};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::core::CodeAssistClient;
use super::error_classification::TierLookup;

pub const GENERATE_CONTENT: &str = "generateContent";
pub const STREAM_GENERATE_CONTENT: &str = "streamGenerateContent";
pub const COUNT_TOKENS: &str = "countTokens";
pub const ONBOARD_USER: &str = "onboardUser";
pub const LOAD_CODE_ASSIST: &str = "loadCodeAssist";
pub const GET_GLOBAL_USER_SETTING: &str = "getCodeAssistGlobalUserSetting";
pub const SET_GLOBAL_USER_SETTING: &str = "setCodeAssistGlobalUserSetting";
pub const RETRIEVE_USER_QUOTA: &str = "retrieveUserQuota";

// Some endpoints answer with an empty body; treat it as an empty object.
fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    let value = match value {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    Ok(serde_json::from_value(value)?)
}

impl CodeAssistClient {
    pub async fn generate_content(
        &self,
        params: &GenerateContentParams,
        user_prompt_id: &str,
        cancel: Option<CancellationToken>,
    ) -> Result<GenerateContentResponse> {
        let body = convert::to_generate_content_request(
            params,
            user_prompt_id,
            self.project_id(),
            self.session_id(),
        )?;
        let resp = self.request_post(GENERATE_CONTENT, body, cancel).await?;
        convert::from_generate_content_response(resp)
    }

    /// Stream a generation. Each chunk is converted as it arrives.
    pub async fn generate_content_stream(
        &self,
        params: &GenerateContentParams,
        user_prompt_id: &str,
        cancel: Option<CancellationToken>,
    ) -> Result<BoxStream<'static, GenerateContentResponse>> {
        let body = convert::to_generate_content_request(
            params,
            user_prompt_id,
            self.project_id(),
            self.session_id(),
        )?;
        let messages = self
            .request_streaming_post(STREAM_GENERATE_CONTENT, body, cancel)
            .await?;
        Ok(Box::pin(messages.map(|item| {
            item.and_then(convert::from_generate_content_response)
        })))
    }

    pub async fn count_tokens(
        &self,
        params: &CountTokensParams,
        cancel: Option<CancellationToken>,
    ) -> Result<CountTokensResponse> {
        let body = convert::to_count_tokens_request(params)?;
        let resp = self.request_post(COUNT_TOKENS, body, cancel).await?;
        convert::from_count_tokens_response(resp)
    }

    pub async fn onboard_user(
        &self,
        request: &OnboardUserRequest,
        cancel: Option<CancellationToken>,
    ) -> Result<LongRunningOperation> {
        let body = serde_json::to_value(request)?;
        decode(self.request_post(ONBOARD_USER, body, cancel).await?)
    }

    /// Poll a long-running operation returned by [`onboard_user`](Self::onboard_user).
    pub async fn get_operation(
        &self,
        name: &str,
        cancel: Option<CancellationToken>,
    ) -> Result<LongRunningOperation> {
        decode(self.request_get_operation(name, cancel).await?)
    }

    /// Tier lookup with the policy rejection kept visible as [`TierLookup::PolicyRejected`].
    pub async fn load_code_assist_outcome(
        &self,
        request: &LoadCodeAssistRequest,
        cancel: Option<CancellationToken>,
    ) -> Result<TierLookup> {
        let body = serde_json::to_value(request)?;
        let result = self
            .request_post(LOAD_CODE_ASSIST, body, cancel)
            .await
            .and_then(decode::<LoadCodeAssistResponse>);
        TierLookup::from_result(result)
    }

    /// Tier lookup. A `SECURITY_POLICY_VIOLATED` rejection resolves to the
    /// standard tier; every other failure is returned unchanged.
    pub async fn load_code_assist(
        &self,
        request: &LoadCodeAssistRequest,
        cancel: Option<CancellationToken>,
    ) -> Result<LoadCodeAssistResponse> {
        let lookup = self.load_code_assist_outcome(request, cancel).await?;
        if let TierLookup::PolicyRejected(err) = &lookup {
            warn!(error = %err, "tier lookup blocked by security policy; assuming standard tier");
        }
        Ok(lookup.into_response())
    }

    pub async fn get_global_user_setting(
        &self,
        cancel: Option<CancellationToken>,
    ) -> Result<CodeAssistGlobalUserSettingResponse> {
        decode(self.request_get(GET_GLOBAL_USER_SETTING, cancel).await?)
    }

    pub async fn set_global_user_setting(
        &self,
        request: &SetCodeAssistGlobalUserSettingRequest,
        cancel: Option<CancellationToken>,
    ) -> Result<CodeAssistGlobalUserSettingResponse> {
        let body = serde_json::to_value(request)?;
        decode(self.request_post(SET_GLOBAL_USER_SETTING, body, cancel).await?)
    }

    pub async fn retrieve_user_quota(
        &self,
        request: &RetrieveUserQuotaRequest,
        cancel: Option<CancellationToken>,
    ) -> Result<RetrieveUserQuotaResponse> {
        let body = serde_json::to_value(request)?;
        decode(self.request_post(RETRIEVE_USER_QUOTA, body, cancel).await?)
    }

    /// The backend has no embedding endpoint.
    pub async fn embed_content(&self, _request: &Value) -> Result<Value> {
        Err(Error::unsupported("embedContent"))
    }
}
