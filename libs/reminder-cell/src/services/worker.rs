use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, instrument, warn};

use crate::services::delivery::DeliveryExecutor;
use crate::services::queue::ReminderQueue;
use crate::services::rate_limit::RateLimiter;
use crate::{DeliveryOutcome, JobStatus, ReminderError, ReminderJob, WorkerConfig};

/// Bounded pool of workers draining the reminder queue. Throughput is
/// capped by a rate limiter shared across the whole pool.
pub struct ReminderWorkerService {
    worker_id: String,
    config: WorkerConfig,
    queue: Arc<dyn ReminderQueue>,
    executor: Arc<DeliveryExecutor>,
    limiter: Arc<RateLimiter>,
    is_shutdown: Arc<RwLock<bool>>,
}

impl ReminderWorkerService {
    pub fn new(
        config: WorkerConfig,
        queue: Arc<dyn ReminderQueue>,
        executor: Arc<DeliveryExecutor>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
            config.min_send_interval_ms,
        )));

        Self {
            worker_id: config.worker_id.clone(),
            config,
            queue,
            executor,
            limiter,
            is_shutdown: Arc::new(RwLock::new(false)),
        }
    }

    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), ReminderError> {
        info!("Starting reminder worker {}", self.worker_id);

        let mut handles = Vec::new();

        for i in 0..self.config.workers {
            let worker_clone = self.clone_for_worker();
            let worker_name = format!("{}-{}", self.worker_id, i);

            let handle = tokio::spawn(async move { worker_clone.worker_loop(worker_name).await });

            handles.push(handle);
        }

        let shutdown_signal = self.wait_for_shutdown();

        tokio::select! {
            _ = shutdown_signal => {
                info!("Shutdown signal received, stopping worker {}", self.worker_id);
            }
            _ = futures::future::try_join_all(handles) => {
                warn!("All worker loops completed unexpectedly");
            }
        }

        Ok(())
    }

    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown for worker {}", self.worker_id);
        let mut is_shutdown = self.is_shutdown.write().await;
        *is_shutdown = true;
    }

    async fn worker_loop(&self, worker_name: String) -> Result<(), ReminderError> {
        debug!("Worker loop started: {}", worker_name);

        loop {
            if *self.is_shutdown.read().await {
                debug!("Worker {} received shutdown signal", worker_name);
                break;
            }

            match self.queue.dequeue(&worker_name).await {
                Ok(Some(job)) => {
                    // Reserve a send slot before touching the provider.
                    self.limiter.acquire().await;

                    if let Err(e) = self.process_job(job, &worker_name).await {
                        error!("Worker {} failed to process job: {}", worker_name, e);
                    }
                }
                Ok(None) => {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                Err(e) => {
                    error!("Worker {} failed to dequeue job: {}", worker_name, e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }

        debug!("Worker loop ended: {}", worker_name);
        Ok(())
    }

    #[instrument(skip(self, job), fields(job_id = %job.job_id))]
    async fn process_job(&self, job: ReminderJob, worker_name: &str) -> Result<(), ReminderError> {
        info!("Processing job {} with worker {}", job.job_id, worker_name);

        let job_timeout = Duration::from_secs(self.config.job_timeout_seconds);
        let result = timeout(job_timeout, self.executor.execute(&job)).await;

        match result {
            Ok(Ok(DeliveryOutcome::Sent)) => {
                self.queue
                    .update_status(&job.job_id, JobStatus::Completed, None)
                    .await?;
                info!("Job {} completed", job.job_id);
            }
            Ok(Ok(DeliveryOutcome::Skipped(reason))) => {
                self.queue
                    .update_status(&job.job_id, JobStatus::Skipped, Some(reason.clone()))
                    .await?;
                info!("Job {} skipped: {}", job.job_id, reason);
            }
            Ok(Err(e)) => {
                self.handle_failure(&job, e).await?;
            }
            Err(_) => {
                let e = ReminderError::JobTimeout {
                    timeout_seconds: self.config.job_timeout_seconds,
                };
                self.handle_failure(&job, e).await?;
            }
        }

        Ok(())
    }

    async fn handle_failure(
        &self,
        job: &ReminderJob,
        error: ReminderError,
    ) -> Result<(), ReminderError> {
        let error_message = error.to_string();
        self.queue
            .update_status(&job.job_id, JobStatus::Failed, Some(error_message.clone()))
            .await?;

        if error.is_retryable() && job.can_retry() {
            warn!(
                "Job {} will be retried (attempt {}/{}): {}",
                job.job_id,
                job.retry_count + 1,
                job.max_retries,
                error_message
            );
            tokio::time::sleep(Duration::from_secs(self.config.retry_delay_seconds)).await;
            self.queue.retry(&job.job_id).await?;
        } else {
            // The dedup reservation was released with the failure; the
            // next scheduler pass re-offers the pair while the flag is
            // still false.
            error!("Job {} failed: {}", job.job_id, error_message);
        }

        Ok(())
    }

    async fn wait_for_shutdown(&self) {
        loop {
            if *self.is_shutdown.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    fn clone_for_worker(&self) -> Self {
        Self {
            worker_id: self.worker_id.clone(),
            config: self.config.clone(),
            queue: Arc::clone(&self.queue),
            executor: Arc::clone(&self.executor),
            limiter: Arc::clone(&self.limiter),
            is_shutdown: Arc::clone(&self.is_shutdown),
        }
    }
}
