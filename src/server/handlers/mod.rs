pub mod admin;
pub mod chat;
pub mod consultations;
pub mod health;
pub mod knowledge;
pub mod sessions;
