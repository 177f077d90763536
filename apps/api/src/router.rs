use std::sync::Arc;

use axum::{routing::get, Router};

use call_webhook_cell::router::create_webhook_router;
use call_webhook_cell::WebhookState;
use reminder_cell::handlers::ReminderCellState;
use reminder_cell::router::create_reminder_router;

pub fn create_router(
    reminder_state: Arc<ReminderCellState>,
    webhook_state: Arc<WebhookState>,
) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic reminders API is running!" }))
        .nest("/reminders", create_reminder_router(reminder_state))
        .nest("/webhooks", create_webhook_router(webhook_state))
}
