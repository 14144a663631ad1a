//! Learning goal models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// How progress toward a goal is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    /// Done / not done. Target is implicitly 1.
    Boolean,
    /// Counted toward `target_value`.
    #[default]
    Percentage,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Boolean => "boolean",
            GoalType::Percentage => "percentage",
        }
    }
}

impl FromStr for GoalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "boolean" => Ok(GoalType::Boolean),
            "percentage" => Ok(GoalType::Percentage),
            _ => Err(format!("Invalid goal type: {}", s)),
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A learning goal attached to a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub goal_type: GoalType,
    pub target_value: i32,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    /// Target used for completion math. Boolean goals always use 1.
    pub fn effective_target(&self) -> i32 {
        match self.goal_type {
            GoalType::Boolean => 1,
            GoalType::Percentage => self.target_value.max(1),
        }
    }
}

/// Request payload for creating a goal.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    #[validate(
        length(min = 1, max = 255, message = "Název cíle musí mít 1 až 255 znaků"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub title: String,

    #[validate(length(max = 2000, message = "Popis může mít nejvýše 2000 znaků"))]
    pub description: Option<String>,

    pub goal_type: Option<GoalType>,

    #[validate(range(min = 1, message = "Cílová hodnota musí být alespoň 1"))]
    pub target_value: Option<i32>,

    #[validate(range(min = 0, message = "Pořadí nesmí být záporné"))]
    pub order_index: Option<i32>,
}

impl CreateGoalRequest {
    pub fn resolved_goal_type(&self) -> GoalType {
        self.goal_type.unwrap_or_default()
    }

    /// Boolean goals are stored with target 1 regardless of input.
    pub fn resolved_target(&self) -> i32 {
        match self.resolved_goal_type() {
            GoalType::Boolean => 1,
            GoalType::Percentage => self.target_value.unwrap_or(1),
        }
    }
}

/// Request payload for updating a goal.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalRequest {
    #[validate(
        length(min = 1, max = 255, message = "Název cíle musí mít 1 až 255 znaků"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Popis může mít nejvýše 2000 znaků"))]
    pub description: Option<String>,

    pub goal_type: Option<GoalType>,

    #[validate(range(min = 1, message = "Cílová hodnota musí být alespoň 1"))]
    pub target_value: Option<i32>,

    #[validate(range(min = 0, message = "Pořadí nesmí být záporné"))]
    pub order_index: Option<i32>,
}

/// A goal together with one participant's progress on it.
///
/// `progress_id` is `None` when no progress row exists yet, which counts as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalWithProgress {
    #[serde(flatten)]
    pub goal: Goal,
    pub progress_id: Option<Uuid>,
    pub current_value: i32,
    pub is_completed: bool,
    pub percent: u8,
}

/// Goal listing, shaped by the caller. Both variants serialize as a plain
/// array; participant entries carry their own progress.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GoalList {
    Owner(Vec<Goal>),
    Participant(Vec<GoalWithProgress>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(goal_type: GoalType, target_value: i32) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            title: "Vyřeš 3 rovnice".into(),
            description: None,
            goal_type,
            target_value,
            order_index: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_goal_type_parse_and_display() {
        assert_eq!("boolean".parse::<GoalType>().unwrap(), GoalType::Boolean);
        assert_eq!("PERCENTAGE".parse::<GoalType>().unwrap(), GoalType::Percentage);
        assert!("checkbox".parse::<GoalType>().is_err());
        assert_eq!(GoalType::Boolean.to_string(), "boolean");
    }

    #[test]
    fn test_effective_target() {
        assert_eq!(goal(GoalType::Boolean, 10).effective_target(), 1);
        assert_eq!(goal(GoalType::Percentage, 3).effective_target(), 3);
        assert_eq!(goal(GoalType::Percentage, 0).effective_target(), 1);
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateGoalRequest =
            serde_json::from_value(serde_json::json!({ "title": "Diskriminant" })).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.resolved_goal_type(), GoalType::Percentage);
        assert_eq!(req.resolved_target(), 1);
        assert_eq!(req.order_index, None);
    }

    #[test]
    fn test_create_request_boolean_forces_target() {
        let req: CreateGoalRequest = serde_json::from_value(serde_json::json!({
            "title": "Přečti kapitolu",
            "goalType": "boolean",
            "targetValue": 5
        }))
        .unwrap();
        assert_eq!(req.resolved_target(), 1);
    }

    #[test]
    fn test_create_request_validation() {
        let req: CreateGoalRequest = serde_json::from_value(serde_json::json!({
            "title": "   ",
            "targetValue": 0,
            "orderIndex": -1
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("target_value"));
        assert!(fields.contains_key("order_index"));
    }

    #[test]
    fn test_goal_with_progress_serializes_flat() {
        let view = GoalWithProgress {
            goal: goal(GoalType::Percentage, 3),
            progress_id: None,
            current_value: 0,
            is_completed: false,
            percent: 0,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["goalType"], "percentage");
        assert_eq!(json["targetValue"], 3);
        assert_eq!(json["currentValue"], 0);
        assert!(json["progressId"].is_null());
    }

    #[test]
    fn test_goal_list_shapes() {
        let g = goal(GoalType::Percentage, 4);
        let owner = serde_json::to_value(GoalList::Owner(vec![g.clone()])).unwrap();
        assert!(owner[0].get("percent").is_none());
        assert_eq!(owner[0]["targetValue"], 4);

        let participant = serde_json::to_value(GoalList::Participant(vec![GoalWithProgress {
            goal: g,
            progress_id: None,
            current_value: 2,
            is_completed: false,
            percent: 50,
        }]))
        .unwrap();
        assert_eq!(participant[0]["percent"], 50);
        assert_eq!(participant[0]["targetValue"], 4);
        assert!(participant[0]["progressId"].is_null());
    }
}
