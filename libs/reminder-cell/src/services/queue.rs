use async_trait::async_trait;
use chrono::Utc;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::{JobStatus, QueueStats, ReminderError, ReminderJob};

/// Jobs older than this are dropped by the backend.
const JOB_TTL_SECONDS: usize = 604800;

const QUEUE_PENDING: &str = "reminder_queue:pending";
const QUEUE_PROCESSING: &str = "reminder_queue:processing";

/// Durable reminder work queue. Enqueue admits a deterministic job id at
/// most once while its dedup reservation lives; a failed job releases the
/// reservation so the next scheduler pass can offer the pair again.
#[async_trait]
pub trait ReminderQueue: Send + Sync {
    /// Returns true when the job was admitted, false when an identical
    /// job id was already reserved.
    async fn enqueue(&self, job: &ReminderJob) -> Result<bool, ReminderError>;

    async fn dequeue(&self, worker_id: &str) -> Result<Option<ReminderJob>, ReminderError>;

    async fn update_status(
        &self,
        job_id: &str,
        status: JobStatus,
        error_message: Option<String>,
    ) -> Result<(), ReminderError>;

    async fn retry(&self, job_id: &str) -> Result<(), ReminderError>;

    async fn get_job(&self, job_id: &str) -> Result<Option<ReminderJob>, ReminderError>;

    async fn stats(&self) -> QueueStats;
}

pub struct RedisReminderQueue {
    pool: Pool,
    stats: Arc<RwLock<QueueStats>>,
}

impl RedisReminderQueue {
    pub async fn new(redis_url: &str) -> Result<Self, ReminderError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg.create_pool(Some(Runtime::Tokio1)).map_err(|e| {
            ReminderError::QueueError(format!("Failed to create Redis pool: {}", e))
        })?;

        // Test connection
        let mut conn = pool.get().await.map_err(|e| {
            ReminderError::QueueError(format!("Failed to connect to Redis: {}", e))
        })?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis reminder queue initialized successfully");

        Ok(Self {
            pool,
            stats: Arc::new(RwLock::new(QueueStats::default())),
        })
    }

    async fn get_connection(&self) -> Result<Connection, ReminderError> {
        self.pool
            .get()
            .await
            .map_err(|e| ReminderError::QueueError(format!("Failed to get Redis connection: {}", e)))
    }

    fn job_key(job_id: &str) -> String {
        format!("reminder_job:{}", job_id)
    }

    fn dedup_key(job_id: &str) -> String {
        format!("reminder_dedup:{}", job_id)
    }

    async fn load_job(
        &self,
        conn: &mut Connection,
        job_id: &str,
    ) -> Result<Option<ReminderJob>, ReminderError> {
        let job_data: Option<String> = conn.hget(Self::job_key(job_id), "data").await?;
        match job_data {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn save_job(
        &self,
        conn: &mut Connection,
        job: &ReminderJob,
    ) -> Result<(), ReminderError> {
        let job_key = Self::job_key(&job.job_id);
        let job_data = serde_json::to_string(job)?;

        let _: () = conn
            .hset_multiple(
                &job_key,
                &[
                    ("data", job_data.as_str()),
                    ("status", &serde_json::to_string(&job.status)?),
                    ("updated_at", &job.updated_at.to_rfc3339()),
                ],
            )
            .await?;
        let _: () = conn.expire(&job_key, JOB_TTL_SECONDS).await?;

        Ok(())
    }
}

#[async_trait]
impl ReminderQueue for RedisReminderQueue {
    async fn enqueue(&self, job: &ReminderJob) -> Result<bool, ReminderError> {
        let mut conn = self.get_connection().await?;

        // Deterministic job-id dedup: only the first reservation wins.
        let dedup_key = Self::dedup_key(&job.job_id);
        let admitted: bool = conn.set_nx(&dedup_key, Utc::now().to_rfc3339()).await?;
        if !admitted {
            debug!("Job {} already reserved, not re-enqueued", job.job_id);
            return Ok(false);
        }
        let _: () = conn.expire(&dedup_key, JOB_TTL_SECONDS).await?;

        self.save_job(&mut conn, job).await?;
        let _: () = conn.lpush(QUEUE_PENDING, &job.job_id).await?;

        let mut stats = self.stats.write().await;
        stats.queued_jobs += 1;

        debug!("Job {} enqueued successfully", job.job_id);
        Ok(true)
    }

    async fn dequeue(&self, worker_id: &str) -> Result<Option<ReminderJob>, ReminderError> {
        let mut conn = self.get_connection().await?;

        // Atomic pop from pending and push to processing.
        let job_id: Option<String> = conn
            .brpoplpush(QUEUE_PENDING, QUEUE_PROCESSING, 1.0)
            .await?;

        let Some(job_id) = job_id else {
            return Ok(None);
        };

        let Some(mut job) = self.load_job(&mut conn, &job_id).await? else {
            // Expired between enqueue and dequeue; drop the stale entry.
            let _: () = conn.lrem(QUEUE_PROCESSING, 1, &job_id).await?;
            return Ok(None);
        };

        job.worker_id = Some(worker_id.to_string());
        job.status = JobStatus::Processing;
        job.updated_at = Utc::now();

        self.save_job(&mut conn, &job).await?;

        let mut stats = self.stats.write().await;
        if stats.queued_jobs > 0 {
            stats.queued_jobs -= 1;
        }
        stats.processing_jobs += 1;
        drop(stats);

        debug!("Job {} dequeued by worker {}", job.job_id, worker_id);
        Ok(Some(job))
    }

    async fn update_status(
        &self,
        job_id: &str,
        status: JobStatus,
        error_message: Option<String>,
    ) -> Result<(), ReminderError> {
        let mut conn = self.get_connection().await?;

        let Some(mut job) = self.load_job(&mut conn, job_id).await? else {
            return Err(ReminderError::JobNotFound(job_id.to_string()));
        };

        if !job.status.can_transition_to(&status) {
            return Err(ReminderError::InvalidStatusTransition {
                from: format!("{:?}", job.status),
                to: format!("{:?}", status),
            });
        }

        job.status = status;
        job.updated_at = Utc::now();
        job.error_message = error_message;

        if status.is_terminal() {
            job.completed_at = Some(Utc::now());
            let _: () = conn.lrem(QUEUE_PROCESSING, 1, job_id).await?;

            // A failed job releases its dedup reservation so the next
            // scheduler pass can offer the pair again.
            if status == JobStatus::Failed {
                let _: () = conn.del(Self::dedup_key(job_id)).await?;
            }

            let mut stats = self.stats.write().await;
            if stats.processing_jobs > 0 {
                stats.processing_jobs -= 1;
            }
            match status {
                JobStatus::Completed => stats.completed_today += 1,
                JobStatus::Skipped => stats.skipped_today += 1,
                JobStatus::Failed => stats.failed_today += 1,
                _ => {}
            }
        }

        self.save_job(&mut conn, &job).await?;

        debug!("Job {} status updated to {:?}", job_id, status);
        Ok(())
    }

    async fn retry(&self, job_id: &str) -> Result<(), ReminderError> {
        let mut conn = self.get_connection().await?;

        let Some(mut job) = self.load_job(&mut conn, job_id).await? else {
            return Err(ReminderError::JobNotFound(job_id.to_string()));
        };

        if job.status != JobStatus::Failed || !job.can_retry() {
            return Err(ReminderError::MaxRetriesExceeded {
                job_id: job_id.to_string(),
                max_retries: job.max_retries,
            });
        }

        job.retry_count += 1;
        job.status = JobStatus::Retrying;
        job.updated_at = Utc::now();
        job.completed_at = None;
        job.error_message = None;
        job.worker_id = None;

        // Re-reserve the dedup key released when the job failed.
        let dedup_key = Self::dedup_key(job_id);
        let _: bool = conn.set_nx(&dedup_key, Utc::now().to_rfc3339()).await?;
        let _: () = conn.expire(&dedup_key, JOB_TTL_SECONDS).await?;

        self.save_job(&mut conn, &job).await?;
        let _: () = conn.lpush(QUEUE_PENDING, job_id).await?;

        let mut stats = self.stats.write().await;
        stats.queued_jobs += 1;
        drop(stats);

        info!(
            "Job {} retried (attempt {}/{})",
            job_id, job.retry_count, job.max_retries
        );
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<ReminderJob>, ReminderError> {
        let mut conn = self.get_connection().await?;
        self.load_job(&mut conn, job_id).await
    }

    async fn stats(&self) -> QueueStats {
        self.stats.read().await.clone()
    }
}

/// In-process queue with the same contract as the Redis backend. Used in
/// tests and in local runs without Redis; jobs are not durable.
#[derive(Default)]
pub struct InMemoryReminderQueue {
    inner: Mutex<MemoryInner>,
    stats: RwLock<QueueStats>,
}

#[derive(Default)]
struct MemoryInner {
    pending: VecDeque<String>,
    jobs: HashMap<String, ReminderJob>,
    reserved: HashSet<String>,
}

impl InMemoryReminderQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReminderQueue for InMemoryReminderQueue {
    async fn enqueue(&self, job: &ReminderJob) -> Result<bool, ReminderError> {
        let mut inner = self.inner.lock().await;

        if !inner.reserved.insert(job.job_id.clone()) {
            debug!("Job {} already reserved, not re-enqueued", job.job_id);
            return Ok(false);
        }

        inner.jobs.insert(job.job_id.clone(), job.clone());
        inner.pending.push_back(job.job_id.clone());
        drop(inner);

        self.stats.write().await.queued_jobs += 1;
        Ok(true)
    }

    async fn dequeue(&self, worker_id: &str) -> Result<Option<ReminderJob>, ReminderError> {
        let mut inner = self.inner.lock().await;

        let Some(job_id) = inner.pending.pop_front() else {
            return Ok(None);
        };

        let Some(job) = inner.jobs.get_mut(&job_id) else {
            return Ok(None);
        };

        job.worker_id = Some(worker_id.to_string());
        job.status = JobStatus::Processing;
        job.updated_at = Utc::now();
        let job = job.clone();
        drop(inner);

        let mut stats = self.stats.write().await;
        if stats.queued_jobs > 0 {
            stats.queued_jobs -= 1;
        }
        stats.processing_jobs += 1;

        Ok(Some(job))
    }

    async fn update_status(
        &self,
        job_id: &str,
        status: JobStatus,
        error_message: Option<String>,
    ) -> Result<(), ReminderError> {
        let mut inner = self.inner.lock().await;

        let Some(job) = inner.jobs.get_mut(job_id) else {
            return Err(ReminderError::JobNotFound(job_id.to_string()));
        };

        if !job.status.can_transition_to(&status) {
            return Err(ReminderError::InvalidStatusTransition {
                from: format!("{:?}", job.status),
                to: format!("{:?}", status),
            });
        }

        job.status = status;
        job.updated_at = Utc::now();
        job.error_message = error_message;

        if status.is_terminal() {
            job.completed_at = Some(Utc::now());
            if status == JobStatus::Failed {
                inner.reserved.remove(job_id);
            }

            let mut stats = self.stats.write().await;
            if stats.processing_jobs > 0 {
                stats.processing_jobs -= 1;
            }
            match status {
                JobStatus::Completed => stats.completed_today += 1,
                JobStatus::Skipped => stats.skipped_today += 1,
                JobStatus::Failed => stats.failed_today += 1,
                _ => {}
            }
        }

        Ok(())
    }

    async fn retry(&self, job_id: &str) -> Result<(), ReminderError> {
        let mut inner = self.inner.lock().await;

        let Some(job) = inner.jobs.get_mut(job_id) else {
            return Err(ReminderError::JobNotFound(job_id.to_string()));
        };

        if job.status != JobStatus::Failed || !job.can_retry() {
            return Err(ReminderError::MaxRetriesExceeded {
                job_id: job_id.to_string(),
                max_retries: job.max_retries,
            });
        }

        job.retry_count += 1;
        job.status = JobStatus::Retrying;
        job.updated_at = Utc::now();
        job.completed_at = None;
        job.error_message = None;
        job.worker_id = None;

        inner.reserved.insert(job_id.to_string());
        inner.pending.push_back(job_id.to_string());
        drop(inner);

        self.stats.write().await.queued_jobs += 1;
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<ReminderJob>, ReminderError> {
        Ok(self.inner.lock().await.jobs.get(job_id).cloned())
    }

    async fn stats(&self) -> QueueStats {
        self.stats.read().await.clone()
    }
}
