//! Onboarding, tier, settings and quota types

use serde::{Deserialize, Serialize};

/// Service tier identifier. Unknown ids are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserTierId {
    Free,
    Legacy,
    Standard,
    Other(String),
}

impl UserTierId {
    pub fn as_str(&self) -> &str {
        match self {
            UserTierId::Free => "free-tier",
            UserTierId::Legacy => "legacy-tier",
            UserTierId::Standard => "standard-tier",
            UserTierId::Other(id) => id,
        }
    }
}

impl From<String> for UserTierId {
    fn from(id: String) -> Self {
        match id.as_str() {
            "free-tier" => UserTierId::Free,
            "legacy-tier" => UserTierId::Legacy,
            "standard-tier" => UserTierId::Standard,
            _ => UserTierId::Other(id),
        }
    }
}

impl From<UserTierId> for String {
    fn from(id: UserTierId) -> Self {
        id.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiUserTier {
    pub id: UserTierId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_defined_cloudaicompanion_project: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_accepted_tos: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_onboarded_previously: Option<bool>,
}

impl GeminiUserTier {
    pub fn new(id: UserTierId) -> Self {
        Self {
            id,
            name: None,
            description: None,
            user_defined_cloudaicompanion_project: None,
            is_default: None,
            has_accepted_tos: None,
            has_onboarded_previously: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IneligibleTier {
    #[serde(default)]
    pub reason_code: Option<String>,
    #[serde(default)]
    pub reason_message: Option<String>,
    #[serde(default)]
    pub tier_id: Option<UserTierId>,
    #[serde(default)]
    pub tier_name: Option<String>,
}

/// Describes the calling client to the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ide_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ide_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duet_project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_type: Option<String>,
}

impl ClientMetadata {
    /// Metadata for a plugin-style client on an unspecified IDE and platform.
    pub fn plugin(project: Option<String>) -> Self {
        Self {
            ide_type: Some("IDE_UNSPECIFIED".to_string()),
            platform: Some("PLATFORM_UNSPECIFIED".to_string()),
            plugin_type: Some("GEMINI".to_string()),
            duet_project: project,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadCodeAssistRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudaicompanion_project: Option<String>,
    pub metadata: ClientMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadCodeAssistResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_tier: Option<GeminiUserTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tiers: Option<Vec<GeminiUserTier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ineligible_tiers: Option<Vec<IneligibleTier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudaicompanion_project: Option<String>,
}

impl LoadCodeAssistResponse {
    /// `{"currentTier": {"id": "standard-tier"}}`, returned when the backend
    /// rejects the tier lookup for a network security policy.
    pub fn standard_tier_fallback() -> Self {
        Self {
            current_tier: Some(GeminiUserTier::new(UserTierId::Standard)),
            ..Self::default()
        }
    }

    /// The tier flagged as default among the allowed tiers.
    pub fn default_tier(&self) -> Option<&GeminiUserTier> {
        self.allowed_tiers
            .as_ref()?
            .iter()
            .find(|t| t.is_default == Some(true))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_id: Option<UserTierId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudaicompanion_project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ClientMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanionProject {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardUserResponse {
    #[serde(default)]
    pub cloudaicompanion_project: Option<CompanionProject>,
}

/// Long-running operation returned by `onboardUser` and polled by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LongRunningOperation {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub response: Option<OnboardUserResponse>,
}

impl LongRunningOperation {
    pub fn is_done(&self) -> bool {
        self.done.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCodeAssistGlobalUserSettingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudaicompanion_project: Option<String>,
    pub free_tier_data_collection_optin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAssistGlobalUserSettingResponse {
    #[serde(default)]
    pub cloudaicompanion_project: Option<String>,
    #[serde(default)]
    pub free_tier_data_collection_optin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveUserQuotaRequest {
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaBucket {
    #[serde(default)]
    pub remaining_amount: Option<String>,
    #[serde(default)]
    pub remaining_fraction: Option<f64>,
    #[serde(default)]
    pub reset_time: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrieveUserQuotaResponse {
    #[serde(default)]
    pub buckets: Vec<QuotaBucket>,
}
