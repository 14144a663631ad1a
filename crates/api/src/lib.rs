//! Classroom engagement backend: groups with goals, participant progress,
//! chat, help requests and realtime delivery to connected clients.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod services;
