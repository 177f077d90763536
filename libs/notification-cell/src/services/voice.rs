use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::channel::VoiceChannel;
use crate::models::{
    validate_phone, CallContext, ConversationInitiationData, NotificationError,
    OutboundCallRequest, OutboundCallResponse,
};

/// Voice-agent provider client. Starts outbound AI-driven calls; the
/// conversation id it returns is the key later webhooks join on.
pub struct VoiceAgentClient {
    client: Client,
    base_url: String,
    api_key: String,
    agent_id: String,
    agent_phone_number_id: String,
}

impl VoiceAgentClient {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        if !config.is_voice_agent_configured() {
            return Err(NotificationError::NotConfigured("voice_agent"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_seconds))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            client,
            base_url: config.voice_agent_api_url.clone(),
            api_key: config.voice_agent_api_key.clone(),
            agent_id: config.voice_agent_id.clone(),
            agent_phone_number_id: config.voice_agent_phone_number_id.clone(),
        })
    }
}

#[async_trait]
impl VoiceChannel for VoiceAgentClient {
    async fn start_call(
        &self,
        to: &str,
        context: &CallContext,
    ) -> Result<String, NotificationError> {
        validate_phone(to)?;

        let url = format!("{}/convai/twilio/outbound-call", self.base_url);

        let request_body = OutboundCallRequest {
            agent_id: self.agent_id.clone(),
            agent_phone_number_id: self.agent_phone_number_id.clone(),
            to_number: to.to_string(),
            conversation_initiation_client_data: ConversationInitiationData {
                dynamic_variables: context.clone(),
            },
        };

        debug!("Starting outbound voice call via: {}", url);

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!("Voice call initiation failed: {} - {}", status, response_text);
            return Err(NotificationError::Provider {
                status: status.as_u16(),
                message: response_text,
            });
        }

        let call_response: OutboundCallResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                NotificationError::UnexpectedResponse(format!(
                    "Failed to parse voice-agent response: {}",
                    e
                ))
            })?;

        let conversation_id = call_response.conversation_id.ok_or_else(|| {
            NotificationError::UnexpectedResponse(
                "response carried no conversation id".to_string(),
            )
        })?;

        info!("Outbound call started, conversation {}", conversation_id);
        Ok(conversation_id)
    }
}
