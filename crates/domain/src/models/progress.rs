//! Goal progress model.
//!
//! Completion state is always derived from the recorded value, the goal's
//! target and its type. A missing progress row is equivalent to a value of 0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;
use validator::Validate;

use super::goal::{Goal, GoalType};

/// Derived completion state of one goal for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub is_completed: bool,
    /// Always within 0..=100.
    pub percent: u8,
}

/// Derives completion from a recorded value.
///
/// Negative values count as 0 and targets below 1 count as 1. The result is
/// monotonic in `current_value`.
pub fn derive_completion(current_value: i32, target_value: i32, goal_type: GoalType) -> Completion {
    let current = current_value.max(0);

    match goal_type {
        GoalType::Boolean => {
            let is_completed = current >= 1;
            Completion {
                is_completed,
                percent: if is_completed { 100 } else { 0 },
            }
        }
        GoalType::Percentage => {
            let target = target_value.max(1);
            let ratio = (f64::from(current) / f64::from(target) * 100.0).round();
            Completion {
                is_completed: current >= target,
                percent: ratio.clamp(0.0, 100.0) as u8,
            }
        }
    }
}

/// Completion derived against a goal definition.
pub fn derive_for_goal(goal: &Goal, current_value: i32) -> Completion {
    derive_completion(current_value, goal.target_value, goal.goal_type)
}

/// Share of `goals` completed in `rows`, rounded to a whole percent.
///
/// Completion is re-derived from each row's `current_value` against the
/// current goal definition; the stored flag is not consulted. Rows for goals
/// not in `goals` are ignored and each goal counts once. No goals yields 0.
pub fn group_completion_rate(goals: &[Goal], rows: &[GoalProgress]) -> u8 {
    if goals.is_empty() {
        return 0;
    }

    let by_id: HashMap<Uuid, &Goal> = goals.iter().map(|g| (g.id, g)).collect();
    let completed: HashSet<Uuid> = rows
        .iter()
        .filter(|row| {
            by_id
                .get(&row.goal_id)
                .is_some_and(|goal| derive_for_goal(goal, row.current_value).is_completed)
        })
        .map(|row| row.goal_id)
        .collect();

    rounded_percent(completed.len(), goals.len())
}

/// `round(100 * part / whole)`, 0 when `whole` is 0.
pub fn rounded_percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let pct = (part as f64 / whole as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// A participant's recorded progress on one goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub goal_id: Uuid,
    pub current_value: i32,
    pub is_completed: bool,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for recording progress.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    #[validate(range(min = 0, max = 1000000, message = "Hodnota musí být mezi 0 a 1000000"))]
    pub current_value: i32,
}

/// Progress row returned to clients, with the derived percentage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub progress: GoalProgress,
    pub percent: u8,
}
