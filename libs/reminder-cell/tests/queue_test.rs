use assert_matches::assert_matches;
use uuid::Uuid;

use reminder_cell::{
    InMemoryReminderQueue, JobStatus, ReminderError, ReminderJob, ReminderQueue,
};
use shared_models::ReminderType;

#[tokio::test]
async fn enqueue_admits_job_once() {
    let queue = InMemoryReminderQueue::new();
    let job = ReminderJob::new(Uuid::new_v4(), ReminderType::Whatsapp48h);

    assert!(queue.enqueue(&job).await.expect("enqueue should succeed"));
    // Identical job id from a second scheduler pass is deduplicated.
    assert!(!queue.enqueue(&job).await.expect("enqueue should succeed"));

    let stats = queue.stats().await;
    assert_eq!(stats.queued_jobs, 1);
}

#[tokio::test]
async fn different_windows_are_independent_jobs() {
    let queue = InMemoryReminderQueue::new();
    let appointment_id = Uuid::new_v4();

    let job_48h = ReminderJob::new(appointment_id, ReminderType::Whatsapp48h);
    let job_24h = ReminderJob::new(appointment_id, ReminderType::Whatsapp24h);

    assert!(queue.enqueue(&job_48h).await.expect("enqueue should succeed"));
    assert!(queue.enqueue(&job_24h).await.expect("enqueue should succeed"));

    assert_eq!(queue.stats().await.queued_jobs, 2);
}

#[tokio::test]
async fn dequeue_assigns_worker_and_marks_processing() {
    let queue = InMemoryReminderQueue::new();
    let job = ReminderJob::new(Uuid::new_v4(), ReminderType::Whatsapp72h);
    queue.enqueue(&job).await.expect("enqueue should succeed");

    let dequeued = queue
        .dequeue("worker-1")
        .await
        .expect("dequeue should succeed")
        .expect("a job should be available");

    assert_eq!(dequeued.job_id, job.job_id);
    assert_eq!(dequeued.status, JobStatus::Processing);
    assert_eq!(dequeued.worker_id, Some("worker-1".to_string()));

    let stats = queue.stats().await;
    assert_eq!(stats.queued_jobs, 0);
    assert_eq!(stats.processing_jobs, 1);
}

#[tokio::test]
async fn dequeue_on_empty_queue_returns_none() {
    let queue = InMemoryReminderQueue::new();
    let result = queue.dequeue("worker-1").await.expect("dequeue should succeed");
    assert!(result.is_none());
}

#[tokio::test]
async fn invalid_transition_is_rejected() {
    let queue = InMemoryReminderQueue::new();
    let job = ReminderJob::new(Uuid::new_v4(), ReminderType::Whatsapp24h);
    queue.enqueue(&job).await.expect("enqueue should succeed");

    // Queued cannot jump straight to Completed.
    let result = queue
        .update_status(&job.job_id, JobStatus::Completed, None)
        .await;
    assert_matches!(
        result,
        Err(ReminderError::InvalidStatusTransition { .. })
    );
}

#[tokio::test]
async fn unknown_job_is_reported_as_missing() {
    let queue = InMemoryReminderQueue::new();
    let result = queue
        .update_status("missing-job", JobStatus::Failed, None)
        .await;
    assert_matches!(result, Err(ReminderError::JobNotFound(_)));
}

#[tokio::test]
async fn failed_job_can_be_retried_until_the_cap() {
    let queue = InMemoryReminderQueue::new();
    let job = ReminderJob::new(Uuid::new_v4(), ReminderType::VoiceCall);
    queue.enqueue(&job).await.expect("enqueue should succeed");

    for attempt in 1..=job.max_retries {
        queue
            .dequeue("worker-1")
            .await
            .expect("dequeue should succeed")
            .expect("job should be pending");
        queue
            .update_status(&job.job_id, JobStatus::Failed, Some("provider 503".to_string()))
            .await
            .expect("status update should succeed");

        queue.retry(&job.job_id).await.expect("retry should succeed");

        let retried = queue
            .get_job(&job.job_id)
            .await
            .expect("get should succeed")
            .expect("job should exist");
        assert_eq!(retried.status, JobStatus::Retrying);
        assert_eq!(retried.retry_count, attempt);
        assert!(retried.error_message.is_none());
        assert!(retried.worker_id.is_none());
    }

    // Cap reached: one more failure is terminal.
    queue
        .dequeue("worker-1")
        .await
        .expect("dequeue should succeed")
        .expect("job should be pending");
    queue
        .update_status(&job.job_id, JobStatus::Failed, Some("provider 503".to_string()))
        .await
        .expect("status update should succeed");

    let result = queue.retry(&job.job_id).await;
    assert_matches!(result, Err(ReminderError::MaxRetriesExceeded { .. }));

    let failed = queue
        .get_job(&job.job_id)
        .await
        .expect("get should succeed")
        .expect("job should exist");
    assert_eq!(failed.status, JobStatus::Failed);
    assert!(failed.completed_at.is_some());
    assert_eq!(failed.error_message, Some("provider 503".to_string()));
}

#[tokio::test]
async fn terminal_failure_releases_the_dedup_reservation() {
    let queue = InMemoryReminderQueue::new();
    let job = ReminderJob::new(Uuid::new_v4(), ReminderType::Whatsapp48h);
    queue.enqueue(&job).await.expect("enqueue should succeed");

    queue
        .dequeue("worker-1")
        .await
        .expect("dequeue should succeed")
        .expect("job should be pending");
    queue
        .update_status(&job.job_id, JobStatus::Failed, Some("boom".to_string()))
        .await
        .expect("status update should succeed");

    // The next scheduler pass may offer the pair again.
    let readmitted = ReminderJob::new(job.appointment_id, job.reminder_type);
    assert!(queue
        .enqueue(&readmitted)
        .await
        .expect("enqueue should succeed"));
}

#[tokio::test]
async fn completed_job_keeps_its_reservation() {
    let queue = InMemoryReminderQueue::new();
    let job = ReminderJob::new(Uuid::new_v4(), ReminderType::Whatsapp48h);
    queue.enqueue(&job).await.expect("enqueue should succeed");

    queue
        .dequeue("worker-1")
        .await
        .expect("dequeue should succeed")
        .expect("job should be pending");
    queue
        .update_status(&job.job_id, JobStatus::Completed, None)
        .await
        .expect("status update should succeed");

    let duplicate = ReminderJob::new(job.appointment_id, job.reminder_type);
    assert!(!queue
        .enqueue(&duplicate)
        .await
        .expect("enqueue should succeed"));

    let stats = queue.stats().await;
    assert_eq!(stats.completed_today, 1);
    assert_eq!(stats.processing_jobs, 0);
}

#[tokio::test]
async fn skipped_job_counts_separately() {
    let queue = InMemoryReminderQueue::new();
    let job = ReminderJob::new(Uuid::new_v4(), ReminderType::Whatsapp24h);
    queue.enqueue(&job).await.expect("enqueue should succeed");

    queue
        .dequeue("worker-1")
        .await
        .expect("dequeue should succeed")
        .expect("job should be pending");
    queue
        .update_status(
            &job.job_id,
            JobStatus::Skipped,
            Some("appointment confirmed".to_string()),
        )
        .await
        .expect("status update should succeed");

    let stats = queue.stats().await;
    assert_eq!(stats.skipped_today, 1);
    assert_eq!(stats.completed_today, 0);
    assert_eq!(stats.failed_today, 0);
}
