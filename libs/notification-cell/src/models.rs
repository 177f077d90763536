use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Channel not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Invalid recipient phone number: {0}")]
    InvalidRecipient(String),

    #[error("Provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider API error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Unexpected provider response: {0}")]
    UnexpectedResponse(String),
}

impl NotificationError {
    /// Permanent errors fail the job immediately; everything else is
    /// subject to the queue's retry policy.
    pub fn is_permanent(&self) -> bool {
        match self {
            NotificationError::NotConfigured(_) | NotificationError::InvalidRecipient(_) => true,
            NotificationError::Provider { status, .. } => {
                (400..500).contains(status) && *status != 408 && *status != 429
            }
            NotificationError::Request(_) | NotificationError::UnexpectedResponse(_) => false,
        }
    }
}

static PHONE_RE: OnceLock<Regex> = OnceLock::new();

/// E.164-ish check. Anything that fails here is a permanent error, not
/// worth retrying.
pub fn validate_phone(phone: &str) -> Result<(), NotificationError> {
    let re = PHONE_RE.get_or_init(|| Regex::new(r"^\+?[1-9][0-9]{7,14}$").expect("valid regex"));
    if re.is_match(phone) {
        Ok(())
    } else {
        Err(NotificationError::InvalidRecipient(phone.to_string()))
    }
}

/// Context handed to the voice agent when a call starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallContext {
    pub patient_name: String,
    pub specialty: String,
    pub doctor_name: String,
    pub appointment_date: String,
}

// WhatsApp Cloud API payloads.

#[derive(Debug, Clone, Serialize)]
pub struct WhatsAppMessageRequest {
    pub messaging_product: String,
    pub to: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub text: WhatsAppTextBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhatsAppTextBody {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppMessageResponse {
    #[serde(default)]
    pub messages: Vec<WhatsAppMessageId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppMessageId {
    pub id: String,
}

// Voice-agent provider payloads.

#[derive(Debug, Clone, Serialize)]
pub struct OutboundCallRequest {
    pub agent_id: String,
    pub agent_phone_number_id: String,
    pub to_number: String,
    pub conversation_initiation_client_data: ConversationInitiationData,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationInitiationData {
    pub dynamic_variables: CallContext,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutboundCallResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub conversation_id: Option<String>,
    #[serde(rename = "callSid")]
    pub call_sid: Option<String>,
}
