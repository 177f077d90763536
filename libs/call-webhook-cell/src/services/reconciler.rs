use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use shared_models::{AppointmentStatus, CallStatus, CallUpdate};
use shared_store::AppointmentStore;

use crate::models::{
    CallFailureData, ReconcileError, TranscriptionData, TranscriptTurn, WebhookEnvelope,
    WebhookEventType,
};
use crate::services::classify::classify_summary;

/// Folds asynchronous voice-agent events into local call and appointment
/// state. The store is the only thing it talks to.
pub struct ReconcilerService {
    store: Arc<dyn AppointmentStore>,
}

impl ReconcilerService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, envelope), fields(event_type = ?envelope.event_type))]
    pub async fn handle_event(&self, envelope: WebhookEnvelope) -> Result<String, ReconcileError> {
        match envelope.event_type {
            WebhookEventType::PostCallTranscription => {
                let data: TranscriptionData = serde_json::from_value(envelope.data)?;
                self.handle_transcription(data).await
            }
            WebhookEventType::PostCallAudio => Ok("audio event ignored".to_string()),
            WebhookEventType::CallInitiationFailure => {
                let data: CallFailureData = serde_json::from_value(envelope.data)?;
                self.handle_call_failure(data).await
            }
        }
    }

    async fn handle_transcription(
        &self,
        data: TranscriptionData,
    ) -> Result<String, ReconcileError> {
        let Some(call) = self
            .store
            .find_call_by_conversation_id(&data.conversation_id)
            .await?
        else {
            // The provider also reports calls we never started (test
            // calls, other tenants); those are not errors.
            info!(
                "No call tracked for conversation {}, ignoring",
                data.conversation_id
            );
            return Ok("unknown conversation, ignored".to_string());
        };

        let status = match data.status.as_deref() {
            Some("done") | Some("completed") => CallStatus::Completed,
            _ => CallStatus::InProgress,
        };

        let summary = data
            .analysis
            .as_ref()
            .and_then(|a| a.transcript_summary.clone());

        let update = CallUpdate {
            status: Some(status),
            transcript: flatten_transcript(&data.transcript),
            summary: summary.clone(),
            duration_seconds: data.metadata.and_then(|m| m.call_duration_secs),
            error_message: None,
            ended_at: Some(Utc::now()),
        };
        self.store.update_call(call.id, update).await?;

        if let (Some(appointment_id), Some(summary)) = (call.appointment_id, summary) {
            if let Some(new_status) = classify_summary(&summary) {
                info!(
                    "Call {} classified as {}, updating appointment {}",
                    call.conversation_id, new_status, appointment_id
                );
                self.store
                    .set_appointment_status(appointment_id, new_status)
                    .await?;
            }
        }

        Ok("transcription processed".to_string())
    }

    async fn handle_call_failure(&self, data: CallFailureData) -> Result<String, ReconcileError> {
        let Some(call) = self
            .store
            .find_call_by_conversation_id(&data.conversation_id)
            .await?
        else {
            info!(
                "No call tracked for conversation {}, ignoring",
                data.conversation_id
            );
            return Ok("unknown conversation, ignored".to_string());
        };

        let reason = data.failure_reason.as_deref().unwrap_or("unknown");
        let status = match reason {
            "busy" => CallStatus::Busy,
            "no_answer" | "no-answer" => CallStatus::NoAnswer,
            _ => CallStatus::Failed,
        };

        let update = CallUpdate {
            status: Some(status),
            error_message: Some(reason.to_string()),
            ended_at: Some(Utc::now()),
            ..Default::default()
        };
        self.store.update_call(call.id, update).await?;

        // The agent could not reach the patient; hand the loop to a human.
        if let Some(appointment_id) = call.appointment_id {
            self.store.set_needs_human_call(appointment_id).await?;
            self.store
                .set_appointment_status(appointment_id, AppointmentStatus::NeedsHumanCall)
                .await?;
            info!(
                "Appointment {} flagged for human follow-up after {} call",
                appointment_id, status
            );
        }

        Ok("call failure recorded".to_string())
    }
}

fn flatten_transcript(turns: &[TranscriptTurn]) -> Option<String> {
    if turns.is_empty() {
        return None;
    }

    let lines: Vec<String> = turns
        .iter()
        .filter_map(|turn| {
            turn.message.as_ref().map(|message| {
                format!("{}: {}", turn.role.as_deref().unwrap_or("unknown"), message)
            })
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
