use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub store_api_key: String,
    pub redis_url: Option<String>,
    pub whatsapp_api_url: String,
    pub whatsapp_api_token: String,
    pub whatsapp_phone_number_id: String,
    pub voice_agent_api_url: String,
    pub voice_agent_api_key: String,
    pub voice_agent_id: String,
    pub voice_agent_phone_number_id: String,
    pub webhook_secret: String,
    pub provider_timeout_seconds: u64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            store_url: env::var("STORE_URL")
                .unwrap_or_else(|_| {
                    warn!("STORE_URL not set, using empty value");
                    String::new()
                }),
            store_api_key: env::var("STORE_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("STORE_API_KEY not set, using empty value");
                    String::new()
                }),
            redis_url: env::var("REDIS_URL").ok(),
            whatsapp_api_url: env::var("WHATSAPP_API_URL")
                .unwrap_or_else(|_| "https://graph.facebook.com/v19.0".to_string()),
            whatsapp_api_token: env::var("WHATSAPP_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("WHATSAPP_API_TOKEN not set, using empty value");
                    String::new()
                }),
            whatsapp_phone_number_id: env::var("WHATSAPP_PHONE_NUMBER_ID")
                .unwrap_or_else(|_| {
                    warn!("WHATSAPP_PHONE_NUMBER_ID not set, using empty value");
                    String::new()
                }),
            voice_agent_api_url: env::var("VOICE_AGENT_API_URL")
                .unwrap_or_else(|_| "https://api.elevenlabs.io/v1".to_string()),
            voice_agent_api_key: env::var("VOICE_AGENT_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("VOICE_AGENT_API_KEY not set, using empty value");
                    String::new()
                }),
            voice_agent_id: env::var("VOICE_AGENT_ID")
                .unwrap_or_else(|_| {
                    warn!("VOICE_AGENT_ID not set, using empty value");
                    String::new()
                }),
            voice_agent_phone_number_id: env::var("VOICE_AGENT_PHONE_NUMBER_ID")
                .unwrap_or_else(|_| {
                    warn!("VOICE_AGENT_PHONE_NUMBER_ID not set, using empty value");
                    String::new()
                }),
            webhook_secret: env::var("WEBHOOK_SECRET")
                .unwrap_or_else(|_| {
                    warn!("WEBHOOK_SECRET not set, webhook signature checks will reject all events");
                    String::new()
                }),
            provider_timeout_seconds: env::var("PROVIDER_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        };

        if !config.is_store_configured() {
            warn!("Appointment store not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_store_configured(&self) -> bool {
        !self.store_url.is_empty() && !self.store_api_key.is_empty()
    }

    pub fn is_whatsapp_configured(&self) -> bool {
        !self.whatsapp_api_url.is_empty()
            && !self.whatsapp_api_token.is_empty()
            && !self.whatsapp_phone_number_id.is_empty()
    }

    pub fn is_voice_agent_configured(&self) -> bool {
        !self.voice_agent_api_url.is_empty()
            && !self.voice_agent_api_key.is_empty()
            && !self.voice_agent_id.is_empty()
            && !self.voice_agent_phone_number_id.is_empty()
    }
}
