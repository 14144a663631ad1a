//! Group access check.
//!
//! Every group-scoped operation runs through [`authorize`] before touching
//! data. Owners are identified by bearer token, participants by device ID.
//! A missing group is always 404; a device that never joined gets the
//! distinct `not_joined` 404 rather than 403.

use domain::models::{Group, Participant, Role};
use persistence::repositories::{GroupRepository, ParticipantRepository};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Credentials;

/// What the caller must be to the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Owner,
    Participant,
    /// Owner when the bearer matches, otherwise a joined participant.
    Member,
}

#[derive(Debug, Clone)]
pub enum AuthContext {
    Owner { user_id: Uuid, group: Group },
    Participant { participant: Participant, group: Group },
}

impl AuthContext {
    pub fn group(&self) -> &Group {
        match self {
            AuthContext::Owner { group, .. } | AuthContext::Participant { group, .. } => group,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            AuthContext::Owner { .. } => Role::Owner,
            AuthContext::Participant { .. } => Role::Participant,
        }
    }

    pub fn participant(&self) -> Option<&Participant> {
        match self {
            AuthContext::Participant { participant, .. } => Some(participant),
            AuthContext::Owner { .. } => None,
        }
    }
}

/// Outcome of checking credentials against a loaded group.
#[derive(Debug, PartialEq, Eq)]
enum Decision<'a> {
    Owner(Uuid),
    LookupDevice(&'a str),
}

fn decide<'a>(
    group: &Group,
    creds: &'a Credentials,
    relation: Relation,
) -> Result<Decision<'a>, ApiError> {
    let owner = creds.user.as_ref().filter(|u| group.is_owned_by(u.user_id));

    match relation {
        Relation::Owner => match (&creds.user, owner) {
            (_, Some(user)) => Ok(Decision::Owner(user.user_id)),
            (Some(_), None) => Err(forbidden()),
            (None, None) => Err(unauthenticated()),
        },
        Relation::Participant => creds
            .device_id
            .as_deref()
            .map(Decision::LookupDevice)
            .ok_or_else(missing_device),
        Relation::Member => {
            if let Some(user) = owner {
                return Ok(Decision::Owner(user.user_id));
            }
            match (&creds.user, creds.device_id.as_deref()) {
                (_, Some(device_id)) => Ok(Decision::LookupDevice(device_id)),
                (Some(_), None) => Err(forbidden()),
                (None, None) => Err(unauthenticated()),
            }
        }
    }
}

fn unauthenticated() -> ApiError {
    ApiError::Unauthorized("Chybí platné přihlášení".into())
}

fn missing_device() -> ApiError {
    ApiError::Unauthorized("Chybí identifikátor zařízení".into())
}

fn forbidden() -> ApiError {
    ApiError::Forbidden("Nejste vlastníkem této skupiny".into())
}

pub fn not_joined() -> ApiError {
    ApiError::NotJoined("Toto zařízení není členem skupiny".into())
}

pub fn group_not_found() -> ApiError {
    ApiError::NotFound("Skupina nebyla nalezena".into())
}

pub async fn load_group(state: &AppState, group_id: Uuid) -> Result<Group, ApiError> {
    GroupRepository::new(state.pool.clone())
        .find_by_id(group_id)
        .await?
        .map(Group::from)
        .ok_or_else(group_not_found)
}

pub async fn authorize(
    state: &AppState,
    creds: &Credentials,
    group_id: Uuid,
    relation: Relation,
) -> Result<AuthContext, ApiError> {
    let group = load_group(state, group_id).await?;
    authorize_group(state, creds, group, relation).await
}

async fn authorize_group(
    state: &AppState,
    creds: &Credentials,
    group: Group,
    relation: Relation,
) -> Result<AuthContext, ApiError> {
    match decide(&group, creds, relation)? {
        Decision::Owner(user_id) => Ok(AuthContext::Owner { user_id, group }),
        Decision::LookupDevice(device_id) => {
            let participant = ParticipantRepository::new(state.pool.clone())
                .find_by_group_and_device(group.id, device_id)
                .await?
                .map(Participant::from)
                .ok_or_else(not_joined)?;
            Ok(AuthContext::Participant { participant, group })
        }
    }
}

/// Records participant activity. Failures are logged and ignored.
pub async fn touch_participant(state: &AppState, ctx: &AuthContext) {
    if let Some(participant) = ctx.participant() {
        if let Err(e) = ParticipantRepository::new(state.pool.clone())
            .touch_activity(participant.id)
            .await
        {
            tracing::warn!(participant_id = %participant.id, error = %e, "Failed to record activity");
        }
    }
}
