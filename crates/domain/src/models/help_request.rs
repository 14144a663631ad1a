//! Help requests raised by participants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Reason stored when the participant gives none.
pub const DEFAULT_HELP_REASON: &str = "inactive";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HelpRequestStatus {
    Pending,
    Resolved,
}

impl HelpRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HelpRequestStatus::Pending => "pending",
            HelpRequestStatus::Resolved => "resolved",
        }
    }
}

impl FromStr for HelpRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(HelpRequestStatus::Pending),
            "resolved" => Ok(HelpRequestStatus::Resolved),
            _ => Err(format!("Invalid help request status: {}", s)),
        }
    }
}

impl fmt::Display for HelpRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `resolved_at` is set exactly when `status` is `Resolved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequest {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub group_id: Uuid,
    pub reason: String,
    pub status: HelpRequestStatus,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl HelpRequest {
    pub fn is_pending(&self) -> bool {
        self.status == HelpRequestStatus::Pending
    }
}

/// Request payload for raising a help request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateHelpRequestRequest {
    #[validate(length(min = 1, max = 255, message = "Důvod musí mít 1 až 255 znaků"))]
    pub reason: Option<String>,
}

impl CreateHelpRequestRequest {
    pub fn resolved_reason(&self) -> String {
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_HELP_REASON)
            .to_string()
    }
}

/// Query parameters for listing help requests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListHelpRequestsQuery {
    pub status: Option<HelpRequestStatus>,
}

/// Response after resolving every pending request of a participant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveAllResponse {
    pub resolved_count: usize,
    pub participant_id: Uuid,
}
