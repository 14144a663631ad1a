//! Participant models. A participant is one device joined to one group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::goal::GoalWithProgress;
use super::group::PublicGroupInfo;
use super::progress::GoalProgress;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Uuid,
    pub group_id: Uuid,
    pub device_id: String,
    pub nickname: String,
    pub joined_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_active: bool,
}

/// Request payload for joining a group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupRequest {
    #[serde(alias = "qrToken")]
    #[validate(length(min = 1, max = 64, message = "Neplatný kód skupiny"))]
    pub join_token: String,

    #[validate(custom(function = "shared::validation::validate_device_id"))]
    pub device_id: String,

    #[validate(
        length(min = 1, max = 50, message = "Přezdívka musí mít 1 až 50 znaků"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub nickname: String,
}

/// Result of a join. `is_existing` is set when the device had already joined.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupResponse {
    pub participant: Participant,
    pub group: PublicGroupInfo,
    pub goals: Vec<GoalWithProgress>,
    /// Raw progress rows, one per goal after a successful join.
    pub progress: Vec<GoalProgress>,
    pub is_existing: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_request_accepts_qr_token_alias() {
        let req: JoinGroupRequest = serde_json::from_value(serde_json::json!({
            "qrToken": "group_1a2b3c4d",
            "deviceId": "device_abc",
            "nickname": "Jana"
        }))
        .unwrap();
        assert_eq!(req.join_token, "group_1a2b3c4d");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_join_request_validation() {
        let req = JoinGroupRequest {
            join_token: String::new(),
            device_id: "bad device".into(),
            nickname: "  ".into(),
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("join_token"));
        assert!(fields.contains_key("device_id"));
        assert!(fields.contains_key("nickname"));
    }
}
