//! Integration tests for the relay against a mocked upstream model.

use std::sync::Arc;

use moodsync_relay::audit::{AuditLog, AuditRecorder};
use moodsync_relay::config::{AiConfig, ProviderKind};
use moodsync_relay::fallback::{canned_response, FallbackPolicy};
use moodsync_relay::relay::{
    AdvisoryProvider, ErrorKind, ModelProvider, Provider, Relay, RelayRequest, RequestKind,
    RequestMetadata, EMPTY_REPLY,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEMINI_PATH: &str = "/models/gemini-test:generateContent";

fn ai_config(provider: ProviderKind, server: &MockServer) -> AiConfig {
    AiConfig {
        provider,
        model: "gemini-test".to_string(),
        base_url: server.uri(),
        timeout_secs: 5,
        ..AiConfig::default()
    }
}

fn gemini_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }]
    })
}

fn chat_reply(text: &str) -> serde_json::Value {
    json!({
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
}

async fn gemini_relay(server: &MockServer) -> Relay {
    let provider = Provider::new(&ai_config(ProviderKind::Gemini, server), "test-key".into())
        .expect("Failed to build provider");
    Relay::new(Arc::new(provider), AuditRecorder::disabled())
}

/// Journal entry relayed through Gemini yields the embedded content and sentiment.
#[tokio::test]
async fn test_gemini_journal_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_string_contains("I feel anxious"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(
            "```json\n{\"content\":\"That sounds hard.\",\"sentiment\":0.4}\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let relay = gemini_relay(&server).await;
    let request = RelayRequest::new(RequestKind::Journal, json!({"text": "I feel anxious"}));
    let advice = relay.advise(&request).await.expect("Relay call failed");

    assert_eq!(advice.content, "That sounds hard.");
    assert_eq!(advice.sentiment, Some(0.4));
    assert!(!advice.parse_degraded);
}

/// Empathy request passes plain prose through and carries the stress label.
#[tokio::test]
async fn test_gemini_empathy_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(body_string_contains("Stress level: low."))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(gemini_reply("Great day! Keep it up.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let relay = gemini_relay(&server).await;
    let request = RelayRequest::new(RequestKind::Empathy, json!({"mood": 85, "weather": "sunny"}));
    let advice = relay.advise(&request).await.expect("Relay call failed");

    assert_eq!(advice.content, "Great day! Keep it up.");
    assert_eq!(advice.sentiment, None);
}

/// Prose reply for a structured kind degrades instead of failing.
#[tokio::test]
async fn test_insight_prose_reply_degrades() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(gemini_reply("Sleep drives your mood.")),
        )
        .mount(&server)
        .await;

    let relay = gemini_relay(&server).await;
    let request = RelayRequest::new(
        RequestKind::Insight,
        json!({"history": [{"date": "Mon", "mood": 60, "sleep": 7}]}),
    );
    let advice = relay.advise(&request).await.expect("Relay call failed");

    assert_eq!(advice.content, "Sleep drives your mood.");
    assert_eq!(advice.sentiment, None);
    assert!(advice.parse_degraded);
}

/// Empty candidate list yields the placeholder text.
#[tokio::test]
async fn test_empty_envelope_yields_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let relay = gemini_relay(&server).await;
    let request = RelayRequest::new(RequestKind::Empathy, json!({"mood": 50, "weather": "cloudy"}));
    let advice = relay.advise(&request).await.expect("Relay call failed");

    assert_eq!(advice.content, EMPTY_REPLY);
}

/// Upstream statuses map onto the error taxonomy and HTTP codes.
#[tokio::test]
async fn test_upstream_status_classification() {
    let cases = [
        (429, "", ErrorKind::RateLimited, 429),
        (402, "", ErrorKind::QuotaExhausted, 402),
        (500, "internal", ErrorKind::Upstream, 500),
        (403, "{\"error\":{\"status\":\"RESOURCE_EXHAUSTED\"}}", ErrorKind::QuotaExhausted, 402),
    ];

    for (status, body, expected_kind, expected_status) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let relay = gemini_relay(&server).await;
        let request = RelayRequest::new(RequestKind::Journal, json!({"text": "hi"}));
        let err = relay.advise(&request).await.expect_err("Expected failure");

        assert_eq!(err.kind(), expected_kind, "status {status}");
        assert_eq!(err.status_code(), expected_status, "status {status}");
    }
}

/// A slow upstream is cut off by the configured timeout.
#[tokio::test]
async fn test_upstream_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_reply("late"))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = AiConfig {
        timeout_secs: 1,
        ..ai_config(ProviderKind::Gemini, &server)
    };
    let provider = Provider::new(&config, "test-key".into()).expect("Failed to build provider");
    let err = provider.generate("prompt").await.expect_err("Expected timeout");

    assert_eq!(err.kind(), ErrorKind::Upstream);
}

/// Chat-completions shape uses bearer auth and reads `choices[0]`.
#[tokio::test]
async fn test_chat_completions_doctor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer gateway-key"))
        .and(body_string_contains("Average mood: 70"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_reply("Stable week. Review sleep.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider = Provider::new(
        &ai_config(ProviderKind::OpenAi, &server),
        "gateway-key".into(),
    )
    .expect("Failed to build provider");
    let relay = Relay::new(Arc::new(provider), AuditRecorder::disabled());

    let request = RelayRequest::new(
        RequestKind::Doctor,
        json!({"moodHistory": [
            {"date": "Mon", "mood": 60, "sleep": 6},
            {"date": "Tue", "mood": 80, "sleep": 8}
        ]}),
    );
    let advice = relay.advise(&request).await.expect("Relay call failed");

    assert_eq!(advice.content, "Stable week. Review sleep.");
    assert_eq!(advice.sentiment, None);
}

/// Chat-completions failures are classified the same way.
#[tokio::test]
async fn test_chat_completions_quota() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(402).set_body_string("credits exhausted"))
        .mount(&server)
        .await;

    let provider = Provider::new(&ai_config(ProviderKind::OpenAi, &server), "k".into())
        .expect("Failed to build provider");
    let err = provider.generate("prompt").await.expect_err("Expected failure");

    assert_eq!(err.kind(), ErrorKind::QuotaExhausted);
}

/// Successful and failed attempts both land in the audit trail.
#[tokio::test]
async fn test_relay_writes_audit_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(body_string_contains("ok entry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(
            "{\"content\":\"Noted.\",\"sentiment\":0.7}",
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(body_string_contains("limited entry"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let audit = Arc::new(AuditLog::open_in_memory().await.expect("Failed to open audit"));
    let provider = Provider::new(&ai_config(ProviderKind::Gemini, &server), "k".into())
        .expect("Failed to build provider");
    let relay = Relay::new(Arc::new(provider), AuditRecorder::new(audit.clone()));

    let metadata = RequestMetadata {
        ip_address: Some("10.1.2.3".to_string()),
        user_agent: Some("moodsync-web".to_string()),
    };
    let ok = RelayRequest::new(RequestKind::Journal, json!({"text": "ok entry"})).with_caller("m-1");
    let limited = RelayRequest::new(RequestKind::Journal, json!({"text": "limited entry"}));

    relay.handle(&ok, &metadata).await.expect("Relay call failed");
    relay.handle(&limited, &metadata).await.expect_err("Expected rate limit");
    relay.recorder().flush().await;

    assert_eq!(audit.count_records().await.unwrap(), 2);
    assert_eq!(audit.count_failures().await.unwrap(), 1);

    let records = audit.recent(10).await.unwrap();
    let success = records.iter().find(|r| r.is_success()).expect("Missing success row");
    assert_eq!(success.caller_id.as_deref(), Some("m-1"));
    assert_eq!(success.response.as_deref(), Some("Noted."));
    assert_eq!(success.finish_reason.as_deref(), Some("STOP"));
    assert_eq!(success.ip_address.as_deref(), Some("10.1.2.3"));
    assert_eq!(success.model, "gemini-test");

    let failure = records.iter().find(|r| !r.is_success()).expect("Missing failure row");
    assert_eq!(failure.error_kind, Some(ErrorKind::RateLimited));
    assert!(failure.response.is_none());
}

/// Fallback policy masks an upstream failure with canned content.
#[tokio::test]
async fn test_fallback_policy_over_live_relay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let policy = FallbackPolicy::new(gemini_relay(&server).await);
    let request = RelayRequest::new(RequestKind::Journal, json!({"text": "hello"}));
    let advice = policy.advise(&request).await.expect("Fallback should not fail");

    let (content, sentiment) = canned_response(RequestKind::Journal);
    assert!(advice.degraded);
    assert_eq!(advice.content, content);
    assert_eq!(advice.sentiment, Some(sentiment));
}
