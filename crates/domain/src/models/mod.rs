//! Domain models for the classroom backend.

pub mod dashboard;
pub mod goal;
pub mod group;
pub mod help_request;
pub mod message;
pub mod participant;
pub mod progress;
pub mod realtime;
pub mod user;

pub use goal::{Goal, GoalList, GoalType, GoalWithProgress};
pub use group::{Group, GroupView, PublicGroupInfo};
pub use help_request::{HelpRequest, HelpRequestStatus};
pub use message::{Message, MessageView, NewMessage};
pub use participant::Participant;
pub use progress::{derive_completion, group_completion_rate, Completion, GoalProgress};
pub use realtime::{EventEnvelope, RealtimeEvent, Role};
pub use user::{User, UserRole};
