use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

use shared_store::AppointmentStore;

use crate::services::queue::ReminderQueue;
use crate::{ReminderJob, SchedulerConfig};

/// Periodically computes which (appointment, window) pairs are due and
/// pushes one job per pair onto the queue. Scheduling never waits on
/// delivery; a slow provider cannot stall the next scan.
pub struct ReminderScheduler {
    store: Arc<dyn AppointmentStore>,
    queue: Arc<dyn ReminderQueue>,
    config: SchedulerConfig,
    is_shutdown: RwLock<bool>,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        queue: Arc<dyn ReminderQueue>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            queue,
            config,
            is_shutdown: RwLock::new(false),
        }
    }

    /// One scheduling pass. Failures are isolated per window and per
    /// record; a malformed appointment never blocks the rest of the scan.
    #[instrument(skip(self))]
    pub async fn scan_once(&self, now: DateTime<Utc>) -> usize {
        let mut enqueued = 0;

        for window in &self.config.windows {
            let due = match self.store.find_due_appointments(window, now).await {
                Ok(appointments) => appointments,
                Err(e) => {
                    error!("Scan for {} window failed: {}", window.reminder_type, e);
                    continue;
                }
            };

            debug!(
                "{} window: {} candidate appointments",
                window.reminder_type,
                due.len()
            );

            for appointment in due {
                // The store already filters, but re-check in case the
                // backend returned a broader set.
                if appointment.is_resolved()
                    || appointment.reminder_sent(window.reminder_type)
                    || !window.is_due(appointment.appointment_date, now)
                {
                    continue;
                }

                let job = ReminderJob::new(appointment.id, window.reminder_type);
                match self.queue.enqueue(&job).await {
                    Ok(true) => {
                        enqueued += 1;
                        info!(
                            "Queued {} reminder for appointment {}",
                            window.reminder_type, appointment.id
                        );
                    }
                    Ok(false) => {
                        debug!("Job {} already queued", job.job_id);
                    }
                    Err(e) => {
                        error!(
                            "Failed to enqueue {} reminder for appointment {}: {}",
                            window.reminder_type, appointment.id, e
                        );
                    }
                }
            }
        }

        enqueued
    }

    pub async fn run(&self) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.scan_interval_seconds));

        loop {
            interval.tick().await;

            if *self.is_shutdown.read().await {
                break;
            }

            let enqueued = self.scan_once(Utc::now()).await;
            if enqueued > 0 {
                info!("Scheduler pass queued {} reminder jobs", enqueued);
            }
        }

        info!("Reminder scheduler stopped");
    }

    pub async fn shutdown(&self) {
        let mut is_shutdown = self.is_shutdown.write().await;
        *is_shutdown = true;
    }
}
