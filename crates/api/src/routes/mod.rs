//! HTTP route handlers.

pub mod chat;
pub mod goals;
pub mod groups;
pub mod health;
pub mod help_requests;
pub mod messages;
pub mod participants;
pub mod profile;
pub mod progress;
