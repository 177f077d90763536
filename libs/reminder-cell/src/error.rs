use thiserror::Error;

use notification_cell::NotificationError;
use shared_store::StoreError;

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("Queue operation failed: {0}")]
    QueueError(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Invalid job status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Redis connection error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Notification error: {0}")]
    NotificationError(#[from] NotificationError),

    #[error("Job timed out after {timeout_seconds} seconds")]
    JobTimeout { timeout_seconds: u64 },

    #[error("Maximum retry attempts ({max_retries}) exceeded for job {job_id}")]
    MaxRetriesExceeded { job_id: String, max_retries: u32 },
}

impl ReminderError {
    /// Transient failures go back through the queue's retry policy;
    /// everything else fails the job immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReminderError::NotificationError(e) => !e.is_permanent(),
            ReminderError::StoreError(_)
            | ReminderError::RedisError(_)
            | ReminderError::JobTimeout { .. } => true,
            _ => false,
        }
    }
}
