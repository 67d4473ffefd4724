/// Project membership endpoints
///
/// - `GET    /v1/projects/:id/members`: owner entry first, then members
/// - `POST   /v1/projects/:id/members`: invite by email (owner or ADMIN)
/// - `PATCH  /v1/projects/:id/members/:member_id`: change role (owner or ADMIN)
/// - `DELETE /v1/projects/:id/members/:member_id`: remove (owner, ADMIN, or self)
///
/// The owner is listed under the synthetic id `owner-<user id>` and can
/// never be re-roled or removed.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::normalize_email,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sprintboard_shared::{
    auth::{
        authorization::{self, MemberMutation},
        identity::CurrentUser,
    },
    mail::{invitation_email, Invitation},
    models::{
        project_member::{CreateProjectMember, MemberWithUser},
        role::{MemberRole, ProjectRole},
        user::{CreateUser, User},
    },
    store::USERS_EMAIL_KEY,
};
use uuid::Uuid;
use validator::ValidateEmail;

#[derive(Debug, Deserialize)]
pub struct InviteMemberRequest {
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRoleRequest {
    pub role: Option<String>,
}

/// One row of the member list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberView {
    /// Membership id, or `owner-<user id>` for the owner
    pub id: String,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: ProjectRole,
    /// `None` for the owner entry
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MemberView {
    fn owner(project_id: Uuid, owner: &User) -> Self {
        Self {
            id: authorization::owner_entry_id(owner.id),
            project_id,
            user_id: owner.id,
            email: owner.email.clone(),
            name: owner.name.clone(),
            image: owner.image.clone(),
            role: ProjectRole::Owner,
            created_at: None,
            updated_at: None,
        }
    }
}

impl From<MemberWithUser> for MemberView {
    fn from(row: MemberWithUser) -> Self {
        Self {
            id: row.member.id.to_string(),
            project_id: row.member.project_id,
            user_id: row.member.user_id,
            email: row.email,
            name: row.name,
            image: row.image,
            role: row.member.role.into(),
            created_at: Some(row.member.created_at),
            updated_at: Some(row.member.updated_at),
        }
    }
}

fn parse_role(role: Option<&str>) -> ApiResult<MemberRole> {
    Ok(role.unwrap_or_default().parse::<MemberRole>()?)
}

pub async fn list_members(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberView>>> {
    authorization::require_access(state.store.as_ref(), user.id, project_id).await?;

    let project = state
        .store
        .find_project(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let owner = state
        .store
        .find_user_by_id(project.owner_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project owner not found".to_string()))?;

    let members = state.store.list_members(project_id).await?;

    let mut views = Vec::with_capacity(members.len() + 1);
    views.push(MemberView::owner(project_id, &owner));
    views.extend(members.into_iter().map(MemberView::from));

    Ok(Json(views))
}

/// Invite someone to a project by email
///
/// ```text
/// POST /v1/projects/:id/members
///
/// { "email": "grace@example.com", "role": "DEVELOPER" }
/// ```
///
/// Unknown addresses get a placeholder account that is claimed on
/// registration. The invitation email is sent in the background; a delivery
/// failure is logged and does not undo the membership.
///
/// # Errors
///
/// - `400 Bad Request`: missing/invalid email or role, or inviting the owner
/// - `403 Forbidden`: caller is a DEVELOPER or CLIENT
/// - `404 Not Found`: project missing or invisible to the caller
/// - `409 Conflict`: already a member
pub async fn invite_member(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
    payload: Result<Json<InviteMemberRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MemberView>)> {
    let store = state.store.as_ref();
    authorization::require_member_management(store, user.id, project_id).await?;

    let Json(req) = payload?;

    let email = req
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email is required".to_string()))?;
    if !email.validate_email() {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }
    let role = parse_role(req.role.as_deref())?;

    let project = store
        .find_project(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let invitee = find_or_create_invitee(&state, &email).await?;
    authorization::ensure_can_invite(store, project_id, &invitee).await?;

    let member = store
        .create_member(CreateProjectMember {
            project_id,
            user_id: invitee.id,
            role,
        })
        .await?;

    tracing::info!(
        %project_id,
        member_id = %member.id,
        invited_by = %user.id,
        %role,
        "Member invited"
    );

    let message = invitation_email(
        &Invitation {
            project_id,
            project_name: &project.name,
            inviter: user.display_name(),
            invitee_email: &invitee.email,
            role,
            app_url: &state.config.app.url,
        },
        &state.config.app.mail_from,
    );
    let mailer = state.mailer.clone();
    tokio::spawn(async move {
        if let Err(err) = mailer.send(&message).await {
            tracing::warn!(error = %err, to = %message.to, "Failed to send invitation email");
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(MemberView::from(MemberWithUser {
            member,
            email: invitee.email,
            name: invitee.name,
            image: invitee.image,
        })),
    ))
}

/// Existing account for `email`, or a new placeholder
///
/// A concurrent invite may create the placeholder first; the loser re-reads.
async fn find_or_create_invitee(state: &AppState, email: &str) -> ApiResult<User> {
    if let Some(user) = state.store.find_user_by_email(email).await? {
        return Ok(user);
    }

    let created = state
        .store
        .create_user(CreateUser {
            email: email.to_string(),
            ..Default::default()
        })
        .await;

    match created {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Placeholder account created for invitee");
            Ok(user)
        }
        Err(err) if err.is_unique(USERS_EMAIL_KEY) => state
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| ApiError::InternalError("Invitee vanished after conflict".to_string())),
        Err(err) => Err(err.into()),
    }
}

pub async fn update_member_role(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, member_ref)): Path<(Uuid, String)>,
    payload: Result<Json<UpdateMemberRoleRequest>, JsonRejection>,
) -> ApiResult<Json<MemberView>> {
    let store = state.store.as_ref();
    let member = authorization::authorize_member_ref_mutation(
        store,
        user.id,
        project_id,
        &member_ref,
        MemberMutation::ChangeRole,
    )
    .await?;

    let Json(req) = payload?;
    let role = parse_role(req.role.as_deref())?;

    let member = store
        .update_member_role(member.id, role)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    let target = store
        .find_user_by_id(member.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    tracing::info!(%project_id, member_id = %member.id, changed_by = %user.id, %role, "Member role changed");

    Ok(Json(MemberView::from(MemberWithUser {
        member,
        email: target.email,
        name: target.name,
        image: target.image,
    })))
}

pub async fn remove_member(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, member_ref)): Path<(Uuid, String)>,
) -> ApiResult<StatusCode> {
    let store = state.store.as_ref();

    let member = authorization::authorize_member_ref_mutation(
        store,
        user.id,
        project_id,
        &member_ref,
        MemberMutation::Remove,
    )
    .await?;

    if !store.delete_member(member.id).await? {
        return Err(ApiError::NotFound("Member not found".to_string()));
    }

    tracing::info!(%project_id, member_id = %member.id, removed_by = %user.id, "Member removed");

    Ok(StatusCode::NO_CONTENT)
}
