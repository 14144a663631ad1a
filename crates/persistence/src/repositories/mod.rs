//! Repository implementations for database operations.

pub mod goal;
pub mod goal_progress;
pub mod group;
pub mod help_request;
pub mod message;
pub mod participant;
pub mod user;

pub use goal::{GoalChanges, GoalRepository, NewGoal};
pub use goal_progress::GoalProgressRepository;
pub use group::GroupRepository;
pub use help_request::HelpRequestRepository;
pub use message::MessageRepository;
pub use participant::ParticipantRepository;
pub use user::UserRepository;
