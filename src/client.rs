//! Code Assist client.
//!
//! Implementation details are split into submodules under `src/client/`:
//! endpoint resolution, call dispatch, error classification and the typed
//! operations.

pub mod builder;
pub mod core;
pub mod dispatch;
pub mod endpoint;
pub mod error_classification;
pub mod methods;

pub use builder::CodeAssistClientBuilder;
pub use self::core::{Call, CodeAssistClient};
pub use endpoint::EndpointExt;
pub use error_classification::{classify, ClassifiedError, TierLookup, SECURITY_POLICY_VIOLATED};
