//! Help request entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::help_request::HelpRequestStatus;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for help_request_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "help_request_status", rename_all = "lowercase")]
pub enum HelpRequestStatusDb {
    Pending,
    Resolved,
}

impl From<HelpRequestStatusDb> for HelpRequestStatus {
    fn from(db_status: HelpRequestStatusDb) -> Self {
        match db_status {
            HelpRequestStatusDb::Pending => HelpRequestStatus::Pending,
            HelpRequestStatusDb::Resolved => HelpRequestStatus::Resolved,
        }
    }
}

impl From<HelpRequestStatus> for HelpRequestStatusDb {
    fn from(status: HelpRequestStatus) -> Self {
        match status {
            HelpRequestStatus::Pending => HelpRequestStatusDb::Pending,
            HelpRequestStatus::Resolved => HelpRequestStatusDb::Resolved,
        }
    }
}

/// Database row mapping for the help_requests table.
#[derive(Debug, Clone, FromRow)]
pub struct HelpRequestEntity {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub group_id: Uuid,
    pub reason: String,
    pub status: HelpRequestStatusDb,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<HelpRequestEntity> for domain::models::HelpRequest {
    fn from(entity: HelpRequestEntity) -> Self {
        Self {
            id: entity.id,
            participant_id: entity.participant_id,
            group_id: entity.group_id,
            reason: entity.reason,
            status: entity.status.into(),
            resolved_by: entity.resolved_by,
            resolved_at: entity.resolved_at,
            created_at: entity.created_at,
        }
    }
}
