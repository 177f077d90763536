use assert_matches::assert_matches;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::{CallContext, NotificationError, VoiceAgentClient, VoiceChannel};
use shared_config::AppConfig;

fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        store_url: String::new(),
        store_api_key: String::new(),
        redis_url: None,
        whatsapp_api_url: String::new(),
        whatsapp_api_token: String::new(),
        whatsapp_phone_number_id: String::new(),
        voice_agent_api_url: base_url.to_string(),
        voice_agent_api_key: "test-key".to_string(),
        voice_agent_id: "agent-1".to_string(),
        voice_agent_phone_number_id: "phone-1".to_string(),
        webhook_secret: String::new(),
        provider_timeout_seconds: 5,
        port: 3000,
    }
}

fn test_context() -> CallContext {
    CallContext {
        patient_name: "María Pérez".to_string(),
        specialty: "Cardiología".to_string(),
        doctor_name: "Dr. Soto".to_string(),
        appointment_date: "12/08/2026 10:30".to_string(),
    }
}

#[tokio::test]
async fn start_call_returns_conversation_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/convai/twilio/outbound-call"))
        .and(header("xi-api-key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "agent_id": "agent-1",
            "agent_phone_number_id": "phone-1",
            "to_number": "+56912345678"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "Call initiated",
            "conversation_id": "conv_123",
            "callSid": "CA999"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = VoiceAgentClient::new(&test_config(&server.uri())).expect("client should build");
    let conversation_id = client
        .start_call("+56912345678", &test_context())
        .await
        .expect("call should start");

    assert_eq!(conversation_id, "conv_123");
}

#[tokio::test]
async fn missing_conversation_id_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/convai/twilio/outbound-call"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "message": "agent busy"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = VoiceAgentClient::new(&test_config(&server.uri())).expect("client should build");
    let err = client
        .start_call("+56912345678", &test_context())
        .await
        .expect_err("call should fail");

    assert_matches!(err, NotificationError::UnexpectedResponse(_));
}

#[tokio::test]
async fn provider_failure_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/convai/twilio/outbound-call"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    let client = VoiceAgentClient::new(&test_config(&server.uri())).expect("client should build");
    let err = client
        .start_call("+56912345678", &test_context())
        .await
        .expect_err("call should fail");

    assert_matches!(err, NotificationError::Provider { status: 500, .. });
    assert!(!err.is_permanent());
}

#[tokio::test]
async fn malformed_phone_never_reaches_the_provider() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = VoiceAgentClient::new(&test_config(&server.uri())).expect("client should build");
    let err = client
        .start_call("12ab", &test_context())
        .await
        .expect_err("call should fail");

    assert_matches!(err, NotificationError::InvalidRecipient(_));
}
