pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use handlers::WebhookState;
pub use models::*;
pub use router::create_webhook_router;
pub use services::classify::classify_summary;
pub use services::reconciler::ReconcilerService;
pub use services::signature::{sign_payload, verify_signature, SignatureError};
