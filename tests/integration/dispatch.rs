//! Dispatcher tests against a scripted transport

use crate::integration::scripted::{
    init_tracing, wait_for_entries, FailingLogger, PanickingLogger, Reply, ScriptedTransport,
    StalledLogger,
};
use code_assist_rpc::audit::{AuditCategory, InMemoryAuditLogger};
use code_assist_rpc::config::{EnvEndpointOverride, SharedEndpointOverride};
use code_assist_rpc::transport::HttpMethod;
use code_assist_rpc::types::{Content, CountTokensParams};
use code_assist_rpc::{Call, CodeAssistClient, EndpointExt, Error};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn client_with(transport: Arc<ScriptedTransport>) -> CodeAssistClient {
    CodeAssistClient::builder()
        .transport(transport)
        .endpoint_override(None::<String>)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_default_method_url() {
    let client = client_with(Arc::new(ScriptedTransport::default()));
    assert_eq!(
        client.method_url("countTokens"),
        "https://cloudcode-pa.googleapis.com/v1internal:countTokens"
    );
}

#[tokio::test]
async fn test_endpoint_override_is_read_per_call() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Reply::Json(json!({})),
        Reply::Json(json!({})),
        Reply::Json(json!({})),
    ]));
    let endpoint = SharedEndpointOverride::new();
    let client = CodeAssistClient::builder()
        .transport(transport.clone())
        .endpoint_override(endpoint.clone())
        .build()
        .unwrap();

    client.request_get("ping", None).await.unwrap();
    endpoint.set("http://127.0.0.1:9999");
    client.request_get("ping", None).await.unwrap();
    endpoint.clear();
    client.request_get("ping", None).await.unwrap();

    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            "https://cloudcode-pa.googleapis.com/v1internal:ping",
            "http://127.0.0.1:9999/v1internal:ping",
            "https://cloudcode-pa.googleapis.com/v1internal:ping",
        ]
    );
}

#[tokio::test]
async fn test_env_override_replaces_base() {
    let var = "CODE_ASSIST_ENDPOINT_DISPATCH_TEST";
    let client = CodeAssistClient::builder()
        .transport(Arc::new(ScriptedTransport::default()))
        .endpoint_override(EnvEndpointOverride::with_var(var))
        .build()
        .unwrap();

    std::env::remove_var(var);
    assert_eq!(
        client.method_url("countTokens"),
        "https://cloudcode-pa.googleapis.com/v1internal:countTokens"
    );
    std::env::set_var(var, "https://staging.example.com");
    assert_eq!(
        client.method_url("countTokens"),
        "https://staging.example.com/v1internal:countTokens"
    );
    std::env::remove_var(var);
}

#[tokio::test]
async fn test_unary_post_shape_and_logging() {
    init_tracing();
    let transport = Arc::new(ScriptedTransport::new(vec![Reply::Json(
        json!({"totalTokens": 7}),
    )]));
    let logger = Arc::new(InMemoryAuditLogger::new(100));
    let client = CodeAssistClient::builder()
        .transport(transport.clone())
        .audit_logger(logger.clone())
        .endpoint_override(None::<String>)
        .header("x-goog-user-project", "proj")
        .build()
        .unwrap();

    let resp = client
        .count_tokens(
            &CountTokensParams {
                model: "gemini-2.5-flash".into(),
                contents: vec![Content::user("hello")],
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(resp.total_tokens, 7);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, HttpMethod::Post);
    assert!(req.url.ends_with("/v1internal:countTokens"));
    assert!(req.query.is_empty());
    assert!(req
        .headers
        .iter()
        .any(|(k, v)| k == "Content-Type" && v == "application/json"));
    assert!(req
        .headers
        .iter()
        .any(|(k, v)| k == "x-goog-user-project" && v == "proj"));
    assert_eq!(
        req.body.as_ref().unwrap()["request"]["model"],
        json!("models/gemini-2.5-flash")
    );

    let sent = wait_for_entries(&logger, AuditCategory::Request, 1).await;
    assert_eq!(sent[0].method, "countTokens");
    let received = wait_for_entries(&logger, AuditCategory::Response, 1).await;
    assert_eq!(received[0].payload, json!({"totalTokens": 7}));
}

#[tokio::test]
async fn test_get_has_no_body() {
    let transport = Arc::new(ScriptedTransport::new(vec![Reply::Json(json!({
        "cloudaicompanionProject": "proj",
        "freeTierDataCollectionOptin": true
    }))]));
    let client = client_with(transport.clone());

    let setting = client.get_global_user_setting(None).await.unwrap();
    assert!(setting.free_tier_data_collection_optin);
    assert_eq!(setting.cloudaicompanion_project.as_deref(), Some("proj"));

    let req = &transport.requests()[0];
    assert_eq!(req.method, HttpMethod::Get);
    assert!(req.body.is_none());
    assert!(req.url.ends_with(":getCodeAssistGlobalUserSetting"));
}

#[tokio::test]
async fn test_call_picks_http_method_from_body() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Reply::Json(json!({"a": 1})),
        Reply::Json(json!({"b": 2})),
    ]));
    let client = client_with(transport.clone());

    assert_eq!(client.call(Call::get("m1")).await.unwrap(), json!({"a": 1}));
    assert_eq!(
        client.call(Call::post("m2", json!({"x": true}))).await.unwrap(),
        json!({"b": 2})
    );

    let methods: Vec<HttpMethod> = transport.requests().iter().map(|r| r.method).collect();
    assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Post]);
}

#[tokio::test]
async fn test_operation_polling_url() {
    let transport = Arc::new(ScriptedTransport::new(vec![Reply::Json(json!({
        "name": "operations/42",
        "done": true,
        "response": {"cloudaicompanionProject": {"id": "proj-1", "name": "Project"}}
    }))]));
    let client = client_with(transport.clone());

    let op = client.get_operation("operations/42", None).await.unwrap();
    assert!(op.is_done());
    assert_eq!(
        op.response.unwrap().cloudaicompanion_project.unwrap().id,
        "proj-1"
    );
    assert_eq!(
        transport.requests()[0].url,
        "https://cloudcode-pa.googleapis.com/v1internal/operations/42"
    );
}

#[tokio::test]
async fn test_empty_body_decodes_as_empty_object() {
    let transport = Arc::new(ScriptedTransport::new(vec![Reply::Json(
        serde_json::Value::Null,
    )]));
    let client = client_with(transport);
    let quota = client
        .retrieve_user_quota(
            &code_assist_rpc::types::RetrieveUserQuotaRequest {
                project: "p".into(),
                user_agent: None,
            },
            None,
        )
        .await
        .unwrap();
    assert!(quota.buckets.is_empty());
}

#[tokio::test]
async fn test_failing_logger_does_not_fail_calls() {
    init_tracing();
    let transport = Arc::new(ScriptedTransport::new(vec![
        Reply::Json(json!({"ok": 1})),
        Reply::Stream(vec!["data: {\"n\":1}\n\n", "data: {\"n\":2}\n\n"]),
    ]));
    let client = CodeAssistClient::builder()
        .transport(transport)
        .audit_logger(Arc::new(FailingLogger))
        .build()
        .unwrap();

    assert_eq!(
        client.request_post("m", json!({}), None).await.unwrap(),
        json!({"ok": 1})
    );

    use futures::StreamExt;
    let messages: Vec<_> = client
        .request_streaming_post("s", json!({}), None)
        .await
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
        .await;
    assert_eq!(messages, vec![json!({"n": 1}), json!({"n": 2})]);
}

#[tokio::test]
async fn test_panicking_logger_does_not_fail_calls() {
    let transport = Arc::new(ScriptedTransport::new(vec![Reply::Json(json!({"ok": 2}))]));
    let client = CodeAssistClient::builder()
        .transport(transport)
        .audit_logger(Arc::new(PanickingLogger))
        .build()
        .unwrap();

    assert_eq!(
        client.request_get("m", None).await.unwrap(),
        json!({"ok": 2})
    );
}

#[tokio::test]
async fn test_stalled_logger_does_not_delay_calls() {
    let transport = Arc::new(ScriptedTransport::new(vec![Reply::Json(json!({"ok": 3}))]));
    let client = CodeAssistClient::builder()
        .transport(transport)
        .audit_logger(Arc::new(StalledLogger))
        .build()
        .unwrap();

    let resp = tokio::time::timeout(Duration::from_secs(1), client.request_get("m", None))
        .await
        .expect("call stalled behind the audit logger")
        .unwrap();
    assert_eq!(resp, json!({"ok": 3}));
}

#[tokio::test]
async fn test_embed_content_is_unsupported() {
    let client = client_with(Arc::new(ScriptedTransport::default()));
    let err = client.embed_content(&json!({})).await.unwrap_err();
    assert!(matches!(err, Error::Unsupported { ref operation } if operation == "embedContent"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_call_logs_request_before_response() {
    let calls = 200;
    let transport = Arc::new(ScriptedTransport::new(
        (0..calls).map(|i| Reply::Json(json!({ "n": i }))).collect(),
    ));
    let logger = Arc::new(InMemoryAuditLogger::new(10_000));
    let client = Arc::new(
        CodeAssistClient::builder()
            .transport(transport)
            .audit_logger(logger.clone())
            .build()
            .unwrap(),
    );

    let tasks: Vec<_> = (0..calls)
        .map(|i| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.request_get(&format!("m{}", i), None).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    wait_for_entries(&logger, AuditCategory::Response, calls).await;
    let entries = logger.entries();
    for i in 0..calls {
        let method = format!("m{}", i);
        let position = |category: AuditCategory| {
            entries
                .iter()
                .position(|e| e.method == method && e.category == category)
                .unwrap()
        };
        assert!(position(AuditCategory::Request) < position(AuditCategory::Response));
    }
}

#[tokio::test]
async fn test_new_session_tags_content_requests() {
    let first = CodeAssistClient::builder()
        .transport(Arc::new(ScriptedTransport::default()))
        .new_session()
        .build()
        .unwrap();
    let second = CodeAssistClient::builder()
        .transport(Arc::new(ScriptedTransport::default()))
        .new_session()
        .build()
        .unwrap();

    let session = first.session_id().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&session).is_ok());
    assert_ne!(first.session_id(), second.session_id());

    let transport = Arc::new(ScriptedTransport::new(vec![Reply::Json(json!({
        "response": {"candidates": []}
    }))]));
    let client = CodeAssistClient::builder()
        .transport(transport.clone())
        .session_id(session.clone())
        .build()
        .unwrap();
    let params = code_assist_rpc::types::GenerateContentParams::new(
        "m",
        vec![Content::user("hi")],
    );
    client.generate_content(&params, "p", None).await.unwrap();
    assert_eq!(
        transport.requests()[0].body.as_ref().unwrap()["request"]["session_id"],
        json!(session)
    );
}
