//! Read models for the owner dashboard and the participant view of a group.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::goal::{Goal, GoalWithProgress};
use super::group::{Group, PublicGroupInfo};
use super::help_request::HelpRequest;
use super::message::MessageView;
use super::participant::Participant;

/// Goal with completion stats across all participants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalStats {
    #[serde(flatten)]
    pub goal: Goal,
    pub completed_by: usize,
    pub total_participants: usize,
    pub completion_rate: u8,
}

/// One participant's progress on one goal. No stored row means zero.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantGoalProgress {
    pub goal_id: Uuid,
    pub current_value: i32,
    pub is_completed: bool,
    pub percent: u8,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantOverview {
    #[serde(flatten)]
    pub participant: Participant,
    pub progress: Vec<ParticipantGoalProgress>,
    pub overall_progress: u8,
    pub completed_goals: usize,
    pub total_goals: usize,
    pub message_count: i64,
    pub help_request_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub total_participants: usize,
    pub total_goals: usize,
    pub average_progress: u8,
    pub active_participants: usize,
    pub pending_help_requests: usize,
}

/// Everything the owner sees for one group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDashboard {
    pub group: Group,
    pub goals: Vec<GoalStats>,
    pub participants: Vec<ParticipantOverview>,
    pub help_requests: Vec<HelpRequest>,
    pub stats: GroupStats,
}

/// What a joined participant sees for one group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub group: PublicGroupInfo,
    pub participant: Participant,
    pub goals: Vec<GoalWithProgress>,
    pub overall_progress: u8,
    pub messages: Vec<MessageView>,
}
