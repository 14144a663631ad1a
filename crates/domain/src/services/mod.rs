//! Domain services for the classroom backend.
//!
//! Services contain business logic that operates on domain models.

pub mod chat;
pub mod dashboard;

pub use chat::{
    ChatContext, ChatMode, ChatReply, ChatResponder, ChatTurn, CompletionClient,
    CompletionError, CompletionOutput, CompletionPrompt, MockCompletionClient,
};
pub use dashboard::{
    build_owner_dashboard, build_participant_view, goals_with_progress, OwnerDashboardInput,
};
