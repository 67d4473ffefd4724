/// Project authorization
///
/// Answers "what may this user do on this project?" from two independent
/// relations: `projects.owner_id` (ownership, permanent) and
/// `project_members` (ADMIN, DEVELOPER or CLIENT). Every check is a fresh
/// read through the [`Store`]; nothing is cached.
///
/// # Permission Model
///
/// | Effective role | Read | Manage members | Owner-only |
/// |----------------|------|----------------|------------|
/// | OWNER          | yes  | yes            | yes        |
/// | ADMIN          | yes  | yes            | no         |
/// | DEVELOPER      | yes  | no             | no         |
/// | CLIENT         | yes  | no             | no         |
/// | (none)         | no   | no             | no         |
///
/// The predicates ([`has_access`], [`can_manage_members`], [`is_owner`],
/// [`effective_role`]) never turn a store failure into `false`; they return
/// the [`StoreError`].
///
/// The `require_*` helpers apply one uniform order: a caller with no
/// relationship to the project gets [`AuthzError::ProjectNotFound`] whether
/// or not the project exists, and [`AuthzError::InsufficientRole`] is only
/// returned to callers holding some role.
///
/// # Owner guard
///
/// Membership mutations go through [`authorize_member_mutation`], which
/// refuses to touch any row belonging to the project owner. The check is on
/// the target's user id, not on its role label.
///
/// # Example
///
/// ```no_run
/// use sprintboard_shared::auth::authorization::{require_member_management, AuthzError};
/// use sprintboard_shared::store::Store;
/// use uuid::Uuid;
///
/// async fn invite(store: &dyn Store, caller: Uuid, project: Uuid) -> Result<(), AuthzError> {
///     let role = require_member_management(store, caller, project).await?;
///     tracing::debug!(%role, "caller may invite");
///     Ok(())
/// }
/// ```

use std::fmt;

use uuid::Uuid;

use crate::models::{
    project_member::ProjectMember,
    role::ProjectRole,
    user::User,
};
use crate::store::{Store, StoreError};

/// Prefix of the synthetic member id the owner is listed under
pub const OWNER_ENTRY_PREFIX: &str = "owner-";

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Missing project, or the caller has no relationship to it
    #[error("Project not found")]
    ProjectNotFound,

    #[error("Member not found")]
    MemberNotFound,

    /// Caller has a role, but not one that grants the permission
    #[error("{}", .permission.denial_message())]
    InsufficientRole {
        permission: ProjectPermission,
        role: ProjectRole,
    },

    #[error("Member does not belong to this project")]
    MemberProjectMismatch,

    #[error("{}", .0.owner_denial_message())]
    OwnerImmutable(MemberMutation),

    #[error("The project owner cannot be invited as a member")]
    AlreadyOwner,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a caller is trying to do on a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectPermission {
    /// View the project, its members and sprints; manage sprints
    Read,

    /// Invite, re-role and remove members
    ManageMembers,

    /// Rename or delete the project
    Own,
}

impl ProjectPermission {
    pub fn allows(&self, role: ProjectRole) -> bool {
        match self {
            ProjectPermission::Read => true,
            ProjectPermission::ManageMembers => role.can_manage_members(),
            ProjectPermission::Own => role.is_owner(),
        }
    }

    fn denial_message(&self) -> &'static str {
        match self {
            ProjectPermission::Read => "You don't have access to this project",
            ProjectPermission::ManageMembers => {
                "You don't have permission to manage members of this project"
            }
            ProjectPermission::Own => "Only the project owner can do this",
        }
    }
}

/// A change to an existing membership row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberMutation {
    ChangeRole,
    Remove,
}

impl MemberMutation {
    fn owner_denial_message(&self) -> &'static str {
        match self {
            MemberMutation::ChangeRole => "Cannot change the owner's role",
            MemberMutation::Remove => "Cannot remove the project owner",
        }
    }
}

impl fmt::Display for MemberMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberMutation::ChangeRole => f.write_str("change_role"),
            MemberMutation::Remove => f.write_str("remove"),
        }
    }
}

pub async fn is_owner(store: &dyn Store, user_id: Uuid, project_id: Uuid) -> Result<bool, StoreError> {
    Ok(store.project_owner(project_id).await? == Some(user_id))
}

/// Owner, or any membership row
pub async fn has_access(store: &dyn Store, user_id: Uuid, project_id: Uuid) -> Result<bool, StoreError> {
    if is_owner(store, user_id, project_id).await? {
        return Ok(true);
    }

    Ok(store.find_membership(project_id, user_id).await?.is_some())
}

/// Owner, or a member with the ADMIN role
pub async fn can_manage_members(
    store: &dyn Store,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<bool, StoreError> {
    if is_owner(store, user_id, project_id).await? {
        return Ok(true);
    }

    Ok(store
        .find_membership(project_id, user_id)
        .await?
        .is_some_and(|m| m.role.can_manage_members()))
}

/// `OWNER` for the owner, the stored role for members, `None` otherwise
pub async fn effective_role(
    store: &dyn Store,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<Option<ProjectRole>, StoreError> {
    let Some(owner_id) = store.project_owner(project_id).await? else {
        return Ok(None);
    };

    if owner_id == user_id {
        return Ok(Some(ProjectRole::Owner));
    }

    Ok(store
        .find_membership(project_id, user_id)
        .await?
        .map(|m| ProjectRole::from(m.role)))
}

/// Resolves the caller's role and checks it grants `permission`
pub async fn require_permission(
    store: &dyn Store,
    user_id: Uuid,
    project_id: Uuid,
    permission: ProjectPermission,
) -> Result<ProjectRole, AuthzError> {
    let role = effective_role(store, user_id, project_id)
        .await?
        .ok_or(AuthzError::ProjectNotFound)?;

    if !permission.allows(role) {
        tracing::debug!(%user_id, %project_id, %role, ?permission, "Permission denied");
        return Err(AuthzError::InsufficientRole { permission, role });
    }

    Ok(role)
}

pub async fn require_access(
    store: &dyn Store,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<ProjectRole, AuthzError> {
    require_permission(store, user_id, project_id, ProjectPermission::Read).await
}

pub async fn require_member_management(
    store: &dyn Store,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<ProjectRole, AuthzError> {
    require_permission(store, user_id, project_id, ProjectPermission::ManageMembers).await
}

pub async fn require_ownership(
    store: &dyn Store,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<ProjectRole, AuthzError> {
    require_permission(store, user_id, project_id, ProjectPermission::Own).await
}

/// Refuses to invite the project owner as a member of their own project
pub async fn ensure_can_invite(
    store: &dyn Store,
    project_id: Uuid,
    invitee: &User,
) -> Result<(), AuthzError> {
    if is_owner(store, invitee.id, project_id).await? {
        return Err(AuthzError::AlreadyOwner);
    }

    Ok(())
}

/// Authorizes a role change or removal of membership `member_id`
///
/// Checks, in order:
///
/// 1. the actor has some role on the project (else `ProjectNotFound`)
/// 2. the membership exists (`MemberNotFound`)
/// 3. it belongs to `project_id` (`MemberProjectMismatch`)
/// 4. it is not the owner's (`OwnerImmutable`), whatever the actor's role
/// 5. the actor may manage members, except that anyone may remove
///    themselves (`InsufficientRole`)
///
/// Returns the target membership.
pub async fn authorize_member_mutation(
    store: &dyn Store,
    actor_id: Uuid,
    project_id: Uuid,
    member_id: Uuid,
    mutation: MemberMutation,
) -> Result<ProjectMember, AuthzError> {
    let actor_role = require_access(store, actor_id, project_id).await?;

    let member = store
        .find_member(member_id)
        .await?
        .ok_or(AuthzError::MemberNotFound)?;

    if member.project_id != project_id {
        return Err(AuthzError::MemberProjectMismatch);
    }

    ensure_not_owner(store, project_id, &member, mutation).await?;

    let removing_self = mutation == MemberMutation::Remove && member.user_id == actor_id;
    if !removing_self && !ProjectPermission::ManageMembers.allows(actor_role) {
        return Err(AuthzError::InsufficientRole {
            permission: ProjectPermission::ManageMembers,
            role: actor_role,
        });
    }

    Ok(member)
}

/// Like [`authorize_member_mutation`], but takes the member id as it appears
/// in a URL
///
/// The owner's synthetic entry (`owner-<uuid>`) is rejected with
/// `OwnerImmutable` once the actor has passed the relationship gate; any
/// other non-UUID is `MemberNotFound`.
pub async fn authorize_member_ref_mutation(
    store: &dyn Store,
    actor_id: Uuid,
    project_id: Uuid,
    member_ref: &str,
    mutation: MemberMutation,
) -> Result<ProjectMember, AuthzError> {
    match Uuid::parse_str(member_ref) {
        Ok(member_id) => {
            authorize_member_mutation(store, actor_id, project_id, member_id, mutation).await
        }
        Err(_) => {
            require_access(store, actor_id, project_id).await?;

            if member_ref.starts_with(OWNER_ENTRY_PREFIX) {
                Err(AuthzError::OwnerImmutable(mutation))
            } else {
                Err(AuthzError::MemberNotFound)
            }
        }
    }
}

/// Id the owner is listed under in member lists
pub fn owner_entry_id(owner_id: Uuid) -> String {
    format!("{OWNER_ENTRY_PREFIX}{owner_id}")
}

async fn ensure_not_owner(
    store: &dyn Store,
    project_id: Uuid,
    member: &ProjectMember,
    mutation: MemberMutation,
) -> Result<(), AuthzError> {
    if is_owner(store, member.user_id, project_id).await? {
        tracing::warn!(
            %project_id,
            member_id = %member.id,
            %mutation,
            "Refused to modify a membership held by the project owner"
        );
        return Err(AuthzError::OwnerImmutable(mutation));
    }

    Ok(())
}
