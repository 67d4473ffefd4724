/// Persistence seam
///
/// Handlers and the authorization service talk to a [`Store`] rather than a
/// `PgPool`, so the same code runs against PostgreSQL ([`PgStore`]) in
/// production and an in-process [`MemoryStore`] in tests and local demos.
///
/// Both implementations enforce the same constraints and report them the
/// same way: a duplicate key is [`StoreError::UniqueViolation`] carrying the
/// PostgreSQL constraint name, a dangling reference is
/// [`StoreError::ForeignKeyViolation`].
///
/// # Example
///
/// ```
/// use sprintboard_shared::models::user::CreateUser;
/// use sprintboard_shared::store::{MemoryStore, Store, StoreError, USERS_EMAIL_KEY};
///
/// # async fn example() -> Result<(), StoreError> {
/// let store = MemoryStore::new();
/// let user = store
///     .create_user(CreateUser {
///         email: "ada@example.com".to_string(),
///         ..Default::default()
///     })
///     .await?;
///
/// let duplicate = store
///     .create_user(CreateUser {
///         email: "ADA@example.com".to_string(),
///         ..Default::default()
///     })
///     .await;
/// assert!(matches!(duplicate, Err(e) if e.is_unique(USERS_EMAIL_KEY)));
/// # Ok(())
/// # }
/// ```

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    project::{CreateProject, Project, ProjectWithRole, UpdateProject},
    project_member::{CreateProjectMember, MemberWithUser, ProjectMember},
    role::MemberRole,
    sprint::{CreateSprint, Sprint, UpdateSprint},
    user::{CreateUser, User},
};

/// Unique constraint on `users.email`
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Unique constraint on `(project_members.project_id, project_members.user_id)`
pub const PROJECT_MEMBERS_PROJECT_USER_KEY: &str = "project_members_project_id_user_id_key";

/// Unique constraint on `(sprints.project_id, sprints.title)`
pub const SPRINTS_PROJECT_TITLE_KEY: &str = "sprints_project_id_title_key";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// True if this is a unique violation of the named constraint
    pub fn is_unique(&self, constraint: &str) -> bool {
        matches!(self, StoreError::UniqueViolation(name) if name == constraint)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();

            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(constraint);
            }
        }

        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Liveness check for the health endpoint
    async fn ping(&self) -> StoreResult<()>;

    // Users

    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// Case-insensitive
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Sets the password on a placeholder; `None` if missing or already claimed
    ///
    /// The caller is trusted to own the placeholder's email; nothing here
    /// verifies the address.
    async fn claim_user(
        &self,
        id: Uuid,
        password_hash: &str,
        name: Option<String>,
    ) -> StoreResult<Option<User>>;

    // Projects

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project>;
    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;
    async fn project_owner(&self, id: Uuid) -> StoreResult<Option<Uuid>>;
    /// Owned and member projects with the user's role, most recently updated first
    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<ProjectWithRole>>;
    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>>;
    /// Also removes the project's memberships and sprints
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    // Memberships

    async fn create_member(&self, data: CreateProjectMember) -> StoreResult<ProjectMember>;
    async fn find_member(&self, id: Uuid) -> StoreResult<Option<ProjectMember>>;
    async fn find_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<ProjectMember>>;
    /// Oldest first
    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<MemberWithUser>>;
    async fn update_member_role(
        &self,
        id: Uuid,
        role: MemberRole,
    ) -> StoreResult<Option<ProjectMember>>;
    async fn delete_member(&self, id: Uuid) -> StoreResult<bool>;

    // Sprints, always scoped to their project

    async fn create_sprint(&self, data: CreateSprint) -> StoreResult<Sprint>;
    async fn find_sprint(&self, project_id: Uuid, id: Uuid) -> StoreResult<Option<Sprint>>;
    /// Newest first
    async fn list_sprints(&self, project_id: Uuid) -> StoreResult<Vec<Sprint>>;
    async fn update_sprint(
        &self,
        project_id: Uuid,
        id: Uuid,
        data: UpdateSprint,
    ) -> StoreResult<Option<Sprint>>;
    async fn delete_sprint(&self, project_id: Uuid, id: Uuid) -> StoreResult<bool>;
}
