//! Domain layer for the classroom backend.
//!
//! This crate contains:
//! - Domain models (Group, Goal, Participant, GoalProgress, Message, HelpRequest)
//! - The goal progress model and realtime event shapes
//! - Business logic services (chat responder, dashboard assembly)

pub mod models;
pub mod services;
