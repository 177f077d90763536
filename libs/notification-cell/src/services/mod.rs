pub mod voice;
pub mod whatsapp;
