use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Local record of an outbound voice-agent call. The conversation id is
/// the only join key back from provider webhooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    pub id: Uuid,
    pub conversation_id: String,
    pub appointment_id: Option<Uuid>,
    pub status: CallStatus,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub duration_seconds: Option<i64>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Call {
    pub fn for_appointment(conversation_id: String, appointment_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            appointment_id: Some(appointment_id),
            status: CallStatus::Initiated,
            transcript: None,
            summary: None,
            duration_seconds: None,
            error_message: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Initiated,
    InProgress,
    Completed,
    Failed,
    Busy,
    NoAnswer,
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStatus::Initiated => write!(f, "initiated"),
            CallStatus::InProgress => write!(f, "in_progress"),
            CallStatus::Completed => write!(f, "completed"),
            CallStatus::Failed => write!(f, "failed"),
            CallStatus::Busy => write!(f, "busy"),
            CallStatus::NoAnswer => write!(f, "no_answer"),
        }
    }
}

/// Partial update applied to a call record. `None` fields are left
/// untouched, so webhook replays converge to the same state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CallStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}
