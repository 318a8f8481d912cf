//! Caller-facing types of the Code Assist API.
//!
//! Payload fields the backend owns (candidate parts, tool schemas, generation
//! config) are kept as `serde_json::Value`; the envelopes around them are typed.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`content`] | Content generation and token counting |
//! | [`account`] | Tiers, onboarding, user settings and quota |

pub mod account;
pub mod content;

pub use account::{
    ClientMetadata, CodeAssistGlobalUserSettingResponse, GeminiUserTier, LoadCodeAssistRequest,
    LoadCodeAssistResponse, LongRunningOperation, OnboardUserRequest, RetrieveUserQuotaRequest,
    RetrieveUserQuotaResponse, SetCodeAssistGlobalUserSettingRequest, UserTierId,
};
pub use content::{
    Content, CountTokensParams, CountTokensResponse, GenerateContentParams,
    GenerateContentResponse,
};
