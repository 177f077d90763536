pub mod classify;
pub mod reconciler;
pub mod signature;
