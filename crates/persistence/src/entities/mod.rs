//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod goal;
pub mod goal_progress;
pub mod group;
pub mod help_request;
pub mod message;
pub mod participant;
pub mod user;

pub use goal::{GoalEntity, GoalTypeDb};
pub use goal_progress::GoalProgressEntity;
pub use group::{GroupEntity, GroupWithCountEntity};
pub use help_request::{HelpRequestEntity, HelpRequestStatusDb};
pub use message::{MessageCountEntity, MessageEntity, MessageWithAuthorEntity};
pub use participant::ParticipantEntity;
pub use user::{UserEntity, UserRoleDb};
