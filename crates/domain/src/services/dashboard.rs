//! Assembles dashboard read models from rows loaded by the caller.

use std::collections::HashMap;
use uuid::Uuid;

use crate::models::dashboard::{
    GoalStats, GroupStats, OwnerDashboard, ParticipantGoalProgress, ParticipantOverview,
    ParticipantView,
};
use crate::models::goal::{Goal, GoalWithProgress};
use crate::models::group::Group;
use crate::models::help_request::HelpRequest;
use crate::models::message::MessageView;
use crate::models::participant::Participant;
use crate::models::progress::{derive_for_goal, group_completion_rate, rounded_percent, GoalProgress};

/// Rows needed to build the owner dashboard.
#[derive(Debug, Clone, Default)]
pub struct OwnerDashboardInput {
    pub goals: Vec<Goal>,
    pub participants: Vec<Participant>,
    pub progress: Vec<GoalProgress>,
    pub message_counts: HashMap<Uuid, i64>,
    pub help_requests: Vec<HelpRequest>,
}

/// Pairs each goal with the participant's row, treating a missing row as zero.
pub fn goals_with_progress(goals: &[Goal], rows: &[GoalProgress]) -> Vec<GoalWithProgress> {
    let by_goal: HashMap<Uuid, &GoalProgress> = rows.iter().map(|r| (r.goal_id, r)).collect();

    goals
        .iter()
        .map(|goal| {
            let row = by_goal.get(&goal.id);
            let current_value = row.map(|r| r.current_value).unwrap_or(0);
            let completion = derive_for_goal(goal, current_value);
            GoalWithProgress {
                goal: goal.clone(),
                progress_id: row.map(|r| r.id),
                current_value,
                is_completed: completion.is_completed,
                percent: completion.percent,
            }
        })
        .collect()
}

pub fn build_owner_dashboard(group: Group, input: OwnerDashboardInput) -> OwnerDashboard {
    let OwnerDashboardInput {
        goals,
        participants,
        progress,
        message_counts,
        help_requests,
    } = input;

    let mut rows_by_participant: HashMap<Uuid, Vec<GoalProgress>> = HashMap::new();
    for row in progress {
        rows_by_participant
            .entry(row.participant_id)
            .or_default()
            .push(row);
    }

    let mut help_counts: HashMap<Uuid, i64> = HashMap::new();
    for request in &help_requests {
        *help_counts.entry(request.participant_id).or_default() += 1;
    }

    let overviews: Vec<ParticipantOverview> = participants
        .into_iter()
        .map(|participant| {
            let rows = rows_by_participant
                .get(&participant.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let progress: Vec<ParticipantGoalProgress> = goals_with_progress(&goals, rows)
                .into_iter()
                .map(|g| ParticipantGoalProgress {
                    goal_id: g.goal.id,
                    current_value: g.current_value,
                    is_completed: g.is_completed,
                    percent: g.percent,
                    updated_at: rows
                        .iter()
                        .find(|r| r.goal_id == g.goal.id)
                        .map(|r| r.updated_at),
                })
                .collect();
            let completed_goals = progress.iter().filter(|p| p.is_completed).count();

            ParticipantOverview {
                message_count: message_counts.get(&participant.id).copied().unwrap_or(0),
                help_request_count: help_counts.get(&participant.id).copied().unwrap_or(0),
                overall_progress: group_completion_rate(&goals, rows),
                completed_goals,
                total_goals: goals.len(),
                progress,
                participant,
            }
        })
        .collect();

    let total_participants = overviews.len();
    let goal_stats: Vec<GoalStats> = goals
        .iter()
        .map(|goal| {
            let completed_by = overviews
                .iter()
                .filter(|o| {
                    o.progress
                        .iter()
                        .any(|p| p.goal_id == goal.id && p.is_completed)
                })
                .count();
            GoalStats {
                goal: goal.clone(),
                completed_by,
                total_participants,
                completion_rate: rounded_percent(completed_by, total_participants),
            }
        })
        .collect();

    let average_progress = if total_participants == 0 {
        0
    } else {
        let sum: u32 = overviews.iter().map(|o| u32::from(o.overall_progress)).sum();
        (f64::from(sum) / total_participants as f64).round() as u8
    };

    let pending: Vec<HelpRequest> = help_requests.into_iter().filter(|r| r.is_pending()).collect();

    let stats = GroupStats {
        total_participants,
        total_goals: goals.len(),
        average_progress,
        active_participants: overviews.iter().filter(|o| o.participant.is_active).count(),
        pending_help_requests: pending.len(),
    };

    OwnerDashboard {
        group,
        goals: goal_stats,
        participants: overviews,
        help_requests: pending,
        stats,
    }
}

pub fn build_participant_view(
    group: &Group,
    participant: Participant,
    goals: &[Goal],
    rows: &[GoalProgress],
    messages: Vec<MessageView>,
) -> ParticipantView {
    ParticipantView {
        group: group.public_info(),
        participant,
        goals: goals_with_progress(goals, rows),
        overall_progress: group_completion_rate(goals, rows),
        messages,
    }
}
