//! Shared utilities for the classroom backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Bearer token verification
//! - Hashing and join-token generation
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod validation;
