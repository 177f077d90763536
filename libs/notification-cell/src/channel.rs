use async_trait::async_trait;

use crate::models::{CallContext, NotificationError};

/// Sends a text message and returns the provider message id.
#[async_trait]
pub trait TextChannel: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<String, NotificationError>;
}

/// Starts an outbound AI-driven voice call and returns the provider
/// conversation id, the join key for later webhooks.
#[async_trait]
pub trait VoiceChannel: Send + Sync {
    async fn start_call(&self, to: &str, context: &CallContext)
        -> Result<String, NotificationError>;
}

/// Stand-in for a channel whose provider is not configured. Every send
/// fails permanently, so jobs surface as failed instead of vanishing.
pub struct DisabledChannel(pub &'static str);

#[async_trait]
impl TextChannel for DisabledChannel {
    async fn send_text(&self, _to: &str, _body: &str) -> Result<String, NotificationError> {
        Err(NotificationError::NotConfigured(self.0))
    }
}

#[async_trait]
impl VoiceChannel for DisabledChannel {
    async fn start_call(
        &self,
        _to: &str,
        _context: &CallContext,
    ) -> Result<String, NotificationError> {
        Err(NotificationError::NotConfigured(self.0))
    }
}
