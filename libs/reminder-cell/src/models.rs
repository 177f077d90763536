use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::{ReminderType, ReminderWindow};

/// One queued reminder delivery. The job id is deterministic so the
/// queue can deduplicate a pair the scheduler offers twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderJob {
    pub job_id: String,
    pub appointment_id: Uuid,
    pub reminder_type: ReminderType,
    pub status: JobStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub worker_id: Option<String>,
}

impl ReminderJob {
    pub fn new(appointment_id: Uuid, reminder_type: ReminderType) -> Self {
        let now = Utc::now();
        Self {
            job_id: Self::job_id_for(appointment_id, reminder_type),
            appointment_id,
            reminder_type,
            status: JobStatus::Queued,
            retry_count: 0,
            max_retries: 3,
            created_at: now,
            updated_at: now,
            completed_at: None,
            error_message: None,
            worker_id: None,
        }
    }

    pub fn job_id_for(appointment_id: Uuid, reminder_type: ReminderType) -> String {
        format!("{}:{}", appointment_id, reminder_type)
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Retrying,
    Completed,
    /// Delivery was not needed anymore (appointment resolved or gone).
    Skipped,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Skipped | JobStatus::Failed
        )
    }

    pub fn can_transition_to(&self, target: &JobStatus) -> bool {
        use JobStatus::*;
        match (self, target) {
            (Queued, Processing) => true,
            (Retrying, Processing) => true,
            (Processing, Completed) => true,
            (Processing, Skipped) => true,
            (_, Failed) => true,
            (Failed, Retrying) => true,
            _ => false,
        }
    }
}

/// Result of a delivery attempt that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Skipped(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStats {
    pub queued_jobs: u64,
    pub processing_jobs: u64,
    pub completed_today: u64,
    pub skipped_today: u64,
    pub failed_today: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub workers: u32,
    pub job_timeout_seconds: u64,
    pub retry_delay_seconds: u64,
    /// Minimum spacing between consecutive sends, shared by all workers.
    pub min_send_interval_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: format!("reminder-worker-{}", Uuid::new_v4()),
            workers: 4,
            job_timeout_seconds: 60,
            retry_delay_seconds: 30,
            min_send_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub scan_interval_seconds: u64,
    pub windows: Vec<ReminderWindow>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scan_interval_seconds: 300,
            windows: ReminderWindow::defaults(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueReminderRequest {
    pub appointment_id: Uuid,
    pub reminder_type: ReminderType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_is_deterministic() {
        let appointment_id = Uuid::new_v4();
        let a = ReminderJob::new(appointment_id, ReminderType::Whatsapp48h);
        let b = ReminderJob::new(appointment_id, ReminderType::Whatsapp48h);
        assert_eq!(a.job_id, b.job_id);

        let c = ReminderJob::new(appointment_id, ReminderType::Whatsapp24h);
        assert_ne!(a.job_id, c.job_id);
    }

    #[test]
    fn terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Skipped.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(!JobStatus::Retrying.is_terminal());
    }

    #[test]
    fn transitions() {
        assert!(JobStatus::Queued.can_transition_to(&JobStatus::Processing));
        assert!(JobStatus::Processing.can_transition_to(&JobStatus::Skipped));
        assert!(JobStatus::Failed.can_transition_to(&JobStatus::Retrying));
        assert!(JobStatus::Retrying.can_transition_to(&JobStatus::Processing));
        assert!(!JobStatus::Queued.can_transition_to(&JobStatus::Completed));
        assert!(!JobStatus::Completed.can_transition_to(&JobStatus::Processing));
    }
}
