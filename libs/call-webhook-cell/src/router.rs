use axum::{routing::post, Router};
use std::sync::Arc;

use crate::handlers::{voice_agent_webhook, WebhookState};

pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/voice-agent", post(voice_agent_webhook))
        .with_state(state)
}
