//! Application services: access control and the completion client.

pub mod access;
pub mod completion;

pub use access::{authorize, load_group, AuthContext, Relation};
pub use completion::OpenAiCompletionClient;
