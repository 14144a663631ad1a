//! Realtime event shapes shared by the push and poll transports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::help_request::{HelpRequest, HelpRequestStatus};
use super::message::Message;
use super::progress::Completion;

/// Role a realtime subscriber connects with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "teacher")]
    Owner,
    #[serde(alias = "student")]
    Participant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Participant => "participant",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" | "teacher" => Ok(Role::Owner),
            "participant" | "student" => Ok(Role::Participant),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub participant_id: Uuid,
    pub goal_id: Uuid,
    pub current_value: i32,
    pub is_completed: bool,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    pub participant_id: Option<Uuid>,
    pub message_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestEvent {
    pub participant_id: Uuid,
    pub request_id: Uuid,
    pub reason: String,
    pub status: HelpRequestStatus,
}

/// A state change worth telling connected clients about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RealtimeEvent {
    GoalProgressUpdated(ProgressEvent),
    MessageCreated(MessageEvent),
    HelpRequestCreated(HelpRequestEvent),
    HelpRequestResolved(HelpRequestEvent),
}

impl RealtimeEvent {
    pub fn progress(participant_id: Uuid, goal_id: Uuid, current_value: i32, completion: Completion) -> Self {
        RealtimeEvent::GoalProgressUpdated(ProgressEvent {
            participant_id,
            goal_id,
            current_value,
            is_completed: completion.is_completed,
            percent: completion.percent,
        })
    }

    pub fn message(message: &Message) -> Self {
        RealtimeEvent::MessageCreated(MessageEvent {
            participant_id: message.participant_id,
            message_id: message.id,
            content: message.content.clone(),
        })
    }

    pub fn help_request(request: &HelpRequest) -> Self {
        let event = HelpRequestEvent {
            participant_id: request.participant_id,
            request_id: request.id,
            reason: request.reason.clone(),
            status: request.status,
        };
        match request.status {
            HelpRequestStatus::Pending => RealtimeEvent::HelpRequestCreated(event),
            HelpRequestStatus::Resolved => RealtimeEvent::HelpRequestResolved(event),
        }
    }

    /// Wire name of the event type.
    pub fn kind(&self) -> &'static str {
        match self {
            RealtimeEvent::GoalProgressUpdated(_) => "goal_progress_updated",
            RealtimeEvent::MessageCreated(_) => "message_created",
            RealtimeEvent::HelpRequestCreated(_) => "help_request_created",
            RealtimeEvent::HelpRequestResolved(_) => "help_request_resolved",
        }
    }

    /// New help requests are only shown to the group owner.
    pub fn visible_to(&self, role: Role) -> bool {
        match self {
            RealtimeEvent::HelpRequestCreated(_) => role == Role::Owner,
            _ => true,
        }
    }
}

/// An event stamped with its server time: `{type, data, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(flatten)]
    pub event: RealtimeEvent,
    pub timestamp: DateTime<Utc>,
}

/// Poll response: everything newer than the caller's cursor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsSince {
    pub updates: Vec<EventEnvelope>,
    pub server_timestamp: DateTime<Utc>,
}

/// Control frames the server sends over the push transport.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    #[serde(rename_all = "camelCase")]
    Connected {
        group_id: Uuid,
        role: Role,
        timestamp: DateTime<Utc>,
    },
    Pong { timestamp: DateTime<Utc> },
}

/// Frames accepted from push clients. Anything else is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Ping,
    #[serde(other)]
    Unknown,
}
