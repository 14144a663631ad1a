//! Custom Axum extractors.

pub mod credentials;
pub mod user_auth;

pub use credentials::{Credentials, DEVICE_ID_HEADER};
pub use user_auth::{OptionalUserAuth, UserAuth};
