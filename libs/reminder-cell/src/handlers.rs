use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

use shared_models::AppError;

use crate::services::queue::ReminderQueue;
use crate::services::scheduler::ReminderScheduler;
use crate::{EnqueueReminderRequest, ReminderJob};

/// Dependencies for the reminder queue endpoints, constructed once at
/// process start.
pub struct ReminderCellState {
    pub queue: Arc<dyn ReminderQueue>,
    pub scheduler: Arc<ReminderScheduler>,
}

/// Enqueue a single reminder job
pub async fn enqueue_reminder(
    State(state): State<Arc<ReminderCellState>>,
    Json(request): Json<EnqueueReminderRequest>,
) -> Result<Json<Value>, AppError> {
    info!(
        "Enqueue request for appointment {} ({})",
        request.appointment_id, request.reminder_type
    );

    let job = ReminderJob::new(request.appointment_id, request.reminder_type);
    let admitted = state.queue.enqueue(&job).await.map_err(|e| {
        error!("Failed to enqueue reminder: {}", e);
        AppError::Internal("Failed to enqueue reminder".to_string())
    })?;

    Ok(Json(json!({
        "success": true,
        "job_id": job.job_id,
        "status": job.status,
        "deduplicated": !admitted,
        "retry_count": job.retry_count,
        "max_retries": job.max_retries
    })))
}

/// Get job status
pub async fn get_job_status(
    State(state): State<Arc<ReminderCellState>>,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let job = state.queue.get_job(&job_id).await.map_err(|e| {
        error!("Failed to get job status: {}", e);
        AppError::Internal("Failed to get job status".to_string())
    })?;

    match job {
        Some(job) => Ok(Json(json!({
            "job_id": job.job_id,
            "appointment_id": job.appointment_id,
            "reminder_type": job.reminder_type,
            "status": job.status,
            "created_at": job.created_at,
            "updated_at": job.updated_at,
            "completed_at": job.completed_at,
            "retry_count": job.retry_count,
            "max_retries": job.max_retries,
            "error_message": job.error_message
        }))),
        None => Err(AppError::NotFound("Job not found".to_string())),
    }
}

/// Get queue statistics
pub async fn get_queue_stats(
    State(state): State<Arc<ReminderCellState>>,
) -> Result<Json<Value>, AppError> {
    let stats = state.queue.stats().await;

    Ok(Json(json!({
        "queued_jobs": stats.queued_jobs,
        "processing_jobs": stats.processing_jobs,
        "completed_today": stats.completed_today,
        "skipped_today": stats.skipped_today,
        "failed_today": stats.failed_today
    })))
}

/// Run one scheduling pass on demand
pub async fn trigger_scan(
    State(state): State<Arc<ReminderCellState>>,
) -> Result<Json<Value>, AppError> {
    info!("On-demand scheduler pass requested");

    let enqueued = state.scheduler.scan_once(Utc::now()).await;

    Ok(Json(json!({
        "success": true,
        "enqueued": enqueued
    })))
}
