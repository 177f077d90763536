pub mod channel;
pub mod models;
pub mod services;

pub use channel::{DisabledChannel, TextChannel, VoiceChannel};
pub use models::*;
pub use services::whatsapp::WhatsAppClient;
pub use services::voice::VoiceAgentClient;
