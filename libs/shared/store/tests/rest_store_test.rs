use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_models::{
    Appointment, AppointmentStatus, CallUpdate, CallStatus, ReminderType, ReminderWindow,
};
use shared_store::{AppointmentStore, RestStore};

fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        store_url: base_url.to_string(),
        store_api_key: "test-api-key".to_string(),
        redis_url: None,
        whatsapp_api_url: String::new(),
        whatsapp_api_token: String::new(),
        whatsapp_phone_number_id: String::new(),
        voice_agent_api_url: String::new(),
        voice_agent_api_key: String::new(),
        voice_agent_id: String::new(),
        voice_agent_phone_number_id: String::new(),
        webhook_secret: String::new(),
        provider_timeout_seconds: 5,
        port: 3000,
    }
}

fn test_appointment() -> Appointment {
    let now = Utc::now();
    Appointment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        appointment_date: now + Duration::hours(47),
        specialty: "Cardiología".to_string(),
        doctor_name: "Dr. Soto".to_string(),
        status: AppointmentStatus::Scheduled,
        reminder_72h_sent: false,
        reminder_72h_sent_at: None,
        reminder_48h_sent: false,
        reminder_48h_sent_at: None,
        reminder_24h_sent: false,
        reminder_24h_sent_at: None,
        call_reminder_sent: false,
        call_reminder_sent_at: None,
        needs_human_call: false,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn find_due_appointments_queries_the_window_flag() {
    let server = MockServer::start().await;
    let appointment = test_appointment();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("reminder_48h_sent", "eq.false"))
        .and(query_param("status", "not.in.(confirmed,cancelled)"))
        .and(header("apikey", "test-api-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([serde_json::to_value(&appointment).unwrap()])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = RestStore::new(&test_config(&server.uri()));
    let window = ReminderWindow::new(ReminderType::Whatsapp48h, 48 * 60, 12 * 60);

    let due = store
        .find_due_appointments(&window, Utc::now())
        .await
        .expect("query should succeed");

    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, appointment.id);
}

#[tokio::test]
async fn get_appointment_returns_none_for_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = RestStore::new(&test_config(&server.uri()));
    let result = store
        .get_appointment(Uuid::new_v4())
        .await
        .expect("query should succeed");

    assert!(result.is_none());
}

#[tokio::test]
async fn set_reminder_sent_patches_the_flag_pair() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(body_partial_json(json!({"reminder_24h_sent": true})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = RestStore::new(&test_config(&server.uri()));
    store
        .set_reminder_sent(id, ReminderType::Whatsapp24h, Utc::now())
        .await
        .expect("patch should succeed");
}

#[tokio::test]
async fn update_call_omits_untouched_fields() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/calls"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(body_partial_json(json!({"status": "busy", "error_message": "busy"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = RestStore::new(&test_config(&server.uri()));
    let update = CallUpdate {
        status: Some(CallStatus::Busy),
        error_message: Some("busy".to_string()),
        ended_at: Some(Utc::now()),
        ..Default::default()
    };

    store
        .update_call(id, update)
        .await
        .expect("patch should succeed");
}

#[tokio::test]
async fn api_errors_are_surfaced_with_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let store = RestStore::new(&test_config(&server.uri()));
    let err = store
        .get_appointment(Uuid::new_v4())
        .await
        .expect_err("query should fail");

    match err {
        shared_store::StoreError::Api { status, .. } => assert_eq!(status, 500),
        other => panic!("unexpected error: {}", other),
    }
}
