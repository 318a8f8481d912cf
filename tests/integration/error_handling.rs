//! Error propagation and the tier-lookup policy fallback

use crate::integration::scripted::{remote_error, Reply, ScriptedTransport};
use code_assist_rpc::client::SECURITY_POLICY_VIOLATED;
use code_assist_rpc::types::{
    ClientMetadata, Content, CountTokensParams, LoadCodeAssistRequest, UserTierId,
};
use code_assist_rpc::{CodeAssistClient, Error, TierLookup};
use serde_json::json;
use std::sync::Arc;

fn client_with(replies: Vec<Reply>) -> CodeAssistClient {
    CodeAssistClient::builder()
        .transport(Arc::new(ScriptedTransport::new(replies)))
        .build()
        .unwrap()
}

fn load_request() -> LoadCodeAssistRequest {
    LoadCodeAssistRequest {
        cloudaicompanion_project: Some("proj".into()),
        metadata: ClientMetadata::plugin(Some("proj".into())),
    }
}

#[tokio::test]
async fn test_policy_rejection_falls_back_to_standard_tier() {
    let client = client_with(vec![Reply::Fail(remote_error(403, SECURITY_POLICY_VIOLATED))]);

    let resp = client.load_code_assist(&load_request(), None).await.unwrap();
    assert_eq!(
        serde_json::to_value(&resp).unwrap(),
        json!({"currentTier": {"id": "standard-tier"}})
    );
}

#[tokio::test]
async fn test_policy_rejection_outcome_is_tagged() {
    let client = client_with(vec![Reply::Fail(remote_error(403, SECURITY_POLICY_VIOLATED))]);

    let outcome = client
        .load_code_assist_outcome(&load_request(), None)
        .await
        .unwrap();
    match outcome {
        TierLookup::PolicyRejected(err) => assert_eq!(err.status(), Some(403)),
        other => panic!("expected policy rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_other_reasons_propagate_from_tier_lookup() {
    let client = client_with(vec![Reply::Fail(remote_error(403, "USER_DISABLED"))]);

    let err = client
        .load_code_assist(&load_request(), None)
        .await
        .unwrap_err();
    let body = err.remote_body().expect("original error body kept");
    assert!(body.has_reason("USER_DISABLED"));
}

#[tokio::test]
async fn test_non_remote_errors_propagate_from_tier_lookup() {
    let client = client_with(vec![Reply::Fail(Error::Cancelled)]);

    let err = client
        .load_code_assist(&load_request(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn test_policy_rejection_propagates_from_other_operations() {
    let client = client_with(vec![
        Reply::Fail(remote_error(403, SECURITY_POLICY_VIOLATED)),
        Reply::Fail(remote_error(403, SECURITY_POLICY_VIOLATED)),
    ]);

    let err = client
        .count_tokens(
            &CountTokensParams {
                model: "m".into(),
                contents: vec![Content::user("x")],
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(err.remote_body().unwrap().has_reason(SECURITY_POLICY_VIOLATED));

    let err = client.get_global_user_setting(None).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_successful_tier_lookup_is_returned_unchanged() {
    let client = client_with(vec![Reply::Json(json!({
        "currentTier": {"id": "free-tier", "name": "Free"},
        "allowedTiers": [{"id": "free-tier", "isDefault": true}],
        "cloudaicompanionProject": "managed-proj"
    }))]);

    let resp = client.load_code_assist(&load_request(), None).await.unwrap();
    assert_eq!(resp.current_tier.unwrap().id, UserTierId::Free);
    assert_eq!(resp.cloudaicompanion_project.as_deref(), Some("managed-proj"));
}

#[tokio::test]
async fn test_streaming_open_failure_propagates() {
    let client = client_with(vec![Reply::Fail(remote_error(429, "RATE_LIMIT_EXCEEDED"))]);

    let err = match client.request_streaming_post("s", json!({}), None).await {
        Ok(_) => panic!("stream should not open"),
        Err(e) => e,
    };
    assert_eq!(err.status(), Some(429));
}
