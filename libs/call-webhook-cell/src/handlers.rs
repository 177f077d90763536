use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, warn};

use crate::models::{WebhookAck, WebhookEnvelope};
use crate::services::reconciler::ReconcilerService;
use crate::services::signature::{verify_signature, SignatureError};

pub const SIGNATURE_HEADER: &str = "elevenlabs-signature";

pub struct WebhookState {
    pub reconciler: ReconcilerService,
    pub webhook_secret: String,
}

/// Voice-agent webhook endpoint. Signature failures are the only 401;
/// after that every outcome acknowledges with 200 so the provider does
/// not retry-storm, and failures are left to the logs.
pub async fn voice_agent_webhook(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature_header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let verification = match signature_header {
        Some(header) => verify_signature(&state.webhook_secret, header, &body, Utc::now().timestamp()),
        None => Err(SignatureError::Missing),
    };

    if let Err(e) = verification {
        warn!("Webhook signature rejected: {}", e);
        return (
            StatusCode::UNAUTHORIZED,
            Json(WebhookAck {
                success: false,
                message: "invalid signature".to_string(),
            }),
        )
            .into_response();
    }

    let envelope: WebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            error!("Malformed webhook payload: {}", e);
            return ack(false, "malformed payload");
        }
    };

    match state.reconciler.handle_event(envelope).await {
        Ok(message) => ack(true, &message),
        Err(e) => {
            error!("Webhook processing failed: {}", e);
            ack(false, "processing failed")
        }
    }
}

fn ack(success: bool, message: &str) -> Response {
    (
        StatusCode::OK,
        Json(WebhookAck {
            success,
            message: message.to_string(),
        }),
    )
        .into_response()
}
