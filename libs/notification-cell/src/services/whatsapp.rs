use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::channel::TextChannel;
use crate::models::{
    validate_phone, NotificationError, WhatsAppMessageRequest, WhatsAppMessageResponse,
    WhatsAppTextBody,
};

/// WhatsApp Cloud API client.
pub struct WhatsAppClient {
    client: Client,
    base_url: String,
    api_token: String,
    phone_number_id: String,
}

impl WhatsAppClient {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        if !config.is_whatsapp_configured() {
            return Err(NotificationError::NotConfigured("whatsapp"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_seconds))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            client,
            base_url: config.whatsapp_api_url.clone(),
            api_token: config.whatsapp_api_token.clone(),
            phone_number_id: config.whatsapp_phone_number_id.clone(),
        })
    }
}

#[async_trait]
impl TextChannel for WhatsAppClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<String, NotificationError> {
        validate_phone(to)?;

        let url = format!("{}/{}/messages", self.base_url, self.phone_number_id);

        let request_body = WhatsAppMessageRequest {
            messaging_product: "whatsapp".to_string(),
            to: to.to_string(),
            message_type: "text".to_string(),
            text: WhatsAppTextBody {
                body: body.to_string(),
            },
        };

        debug!("Sending WhatsApp message to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!("WhatsApp send failed: {} - {}", status, response_text);
            return Err(NotificationError::Provider {
                status: status.as_u16(),
                message: response_text,
            });
        }

        let message_response: WhatsAppMessageResponse = serde_json::from_str(&response_text)
            .map_err(|e| {
                NotificationError::UnexpectedResponse(format!(
                    "Failed to parse WhatsApp response: {}",
                    e
                ))
            })?;

        let message_id = message_response
            .messages
            .first()
            .map(|m| m.id.clone())
            .ok_or_else(|| {
                NotificationError::UnexpectedResponse("response carried no message id".to_string())
            })?;

        info!("WhatsApp message accepted, provider id {}", message_id);
        Ok(message_id)
    }
}
