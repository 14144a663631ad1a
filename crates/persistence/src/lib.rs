//! Persistence layer for the classroom backend.
//!
//! This crate contains:
//! - Database connection management
//! - Typed persistence errors
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - Query metrics

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;

pub use error::{DbError, DbResult};
