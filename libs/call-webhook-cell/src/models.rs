use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use shared_store::StoreError;

/// Envelope every voice-agent webhook arrives in.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(rename = "type")]
    pub event_type: WebhookEventType,
    pub event_timestamp: Option<i64>,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    PostCallTranscription,
    PostCallAudio,
    CallInitiationFailure,
}

/// Payload of a `post_call_transcription` event.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionData {
    pub conversation_id: String,
    pub status: Option<String>,
    #[serde(default)]
    pub transcript: Vec<TranscriptTurn>,
    pub analysis: Option<CallAnalysis>,
    pub metadata: Option<CallMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptTurn {
    pub role: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallAnalysis {
    pub transcript_summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallMetadata {
    pub call_duration_secs: Option<i64>,
}

/// Payload of a `call_initiation_failure` event.
#[derive(Debug, Clone, Deserialize)]
pub struct CallFailureData {
    pub conversation_id: String,
    pub failure_reason: Option<String>,
}

/// Acknowledgment body. Sent with 200 for every event that passed
/// signature verification, whatever happened while processing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub success: bool,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Malformed event payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}
