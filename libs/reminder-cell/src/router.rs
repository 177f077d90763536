use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers::{
    enqueue_reminder, get_job_status, get_queue_stats, trigger_scan, ReminderCellState,
};

pub fn create_reminder_router(state: Arc<ReminderCellState>) -> Router {
    Router::new()
        .route("/enqueue", post(enqueue_reminder))
        .route("/jobs/{job_id}", get(get_job_status))
        .route("/stats", get(get_queue_stats))
        .route("/scan", post(trigger_scan))
        .with_state(state)
}
