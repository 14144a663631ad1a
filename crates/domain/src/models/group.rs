//! Classroom group models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::dashboard::{OwnerDashboard, ParticipantView};

/// A classroom group owned by a teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
    pub join_token: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn public_info(&self) -> PublicGroupInfo {
        PublicGroupInfo {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            is_active: self.is_active,
        }
    }
}

/// Group metadata safe to show before joining.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicGroupInfo {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

/// Request payload for creating a group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(
        length(min = 1, max = 255, message = "Název skupiny musí mít 1 až 255 znaků"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,

    #[validate(
        length(min = 1, max = 2000, message = "Popis musí mít 1 až 2000 znaků"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub description: String,
}

/// Request payload for updating a group.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    #[validate(
        length(min = 1, max = 255, message = "Název skupiny musí mít 1 až 255 znaků"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 2000, message = "Popis musí mít 1 až 2000 znaků"))]
    pub description: Option<String>,

    pub is_active: Option<bool>,
}

/// Group row in the owner's listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    #[serde(flatten)]
    pub group: Group,
    pub participant_count: i64,
}

/// Response for listing groups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGroupsResponse {
    pub data: Vec<GroupSummary>,
    pub count: usize,
}

/// Response after deleting a group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteGroupResponse {
    pub success: bool,
    pub message: String,
}

/// Group detail, shaped by the caller's relation to the group.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum GroupView {
    Owner(OwnerDashboard),
    Participant(ParticipantView),
    Public(PublicGroupInfo),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> Group {
        Group {
            id: Uuid::new_v4(),
            name: "Kvadratické rovnice".into(),
            description: "Procvičení diskriminantu".into(),
            owner_id: Uuid::new_v4(),
            join_token: "group_0a1b2c3d".into(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_owned_by() {
        let g = group();
        assert!(g.is_owned_by(g.owner_id));
        assert!(!g.is_owned_by(Uuid::new_v4()));
    }

    #[test]
    fn test_public_view_is_tagged_and_hides_token() {
        let g = group();
        let json = serde_json::to_value(GroupView::Public(g.public_info())).unwrap();
        assert_eq!(json["view"], "public");
        assert_eq!(json["name"], "Kvadratické rovnice");
        assert_eq!(json["isActive"], true);
        assert!(json.get("joinToken").is_none());
        assert!(json.get("ownerId").is_none());
    }

    #[test]
    fn test_create_request_requires_description() {
        let req: CreateGroupRequest = serde_json::from_value(serde_json::json!({
            "name": "7.A",
            "description": ""
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("description"));
    }

    #[test]
    fn test_create_request_rejects_long_name() {
        let req = CreateGroupRequest {
            name: "x".repeat(256),
            description: "ok".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_request_all_optional() {
        let req: UpdateGroupRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.is_active.is_none());
    }
}
