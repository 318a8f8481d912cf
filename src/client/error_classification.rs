//! Error classification logic
//!
//! Only the tier lookup (`loadCodeAssist`) consults this module. Every other
//! operation propagates transport failures untouched.

use crate::types::LoadCodeAssistResponse;
use crate::{Error, Result};

/// Reason code the backend attaches when a VPC Service Controls perimeter
/// blocks the request.
pub const SECURITY_POLICY_VIOLATED: &str = "SECURITY_POLICY_VIOLATED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifiedError {
    PolicyRejection,
    Other,
}

/// Classify a failure by the structured details of its error envelope.
pub fn classify(err: &Error) -> ClassifiedError {
    match err.remote_body() {
        Some(body) if body.has_reason(SECURITY_POLICY_VIOLATED) => ClassifiedError::PolicyRejection,
        _ => ClassifiedError::Other,
    }
}

/// Outcome of a tier lookup.
#[derive(Debug)]
pub enum TierLookup {
    Loaded(LoadCodeAssistResponse),
    /// The backend refused the lookup for a security policy; the original error
    /// is kept for diagnostics.
    PolicyRejected(Error),
}

impl TierLookup {
    /// Keep successes, tag policy rejections, re-raise everything else.
    pub fn from_result(result: Result<LoadCodeAssistResponse>) -> Result<Self> {
        match result {
            Ok(resp) => Ok(TierLookup::Loaded(resp)),
            Err(err) => match classify(&err) {
                ClassifiedError::PolicyRejection => Ok(TierLookup::PolicyRejected(err)),
                ClassifiedError::Other => Err(err),
            },
        }
    }

    /// The loaded response, or the standard-tier default for a rejection.
    pub fn into_response(self) -> LoadCodeAssistResponse {
        match self {
            TierLookup::Loaded(resp) => resp,
            TierLookup::PolicyRejected(_) => LoadCodeAssistResponse::standard_tier_fallback(),
        }
    }

    pub fn is_policy_rejected(&self) -> bool {
        matches!(self, TierLookup::PolicyRejected(_))
    }
}
