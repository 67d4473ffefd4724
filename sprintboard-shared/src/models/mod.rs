/// Database models for Sprintboard
///
/// Each model owns its table's SQL and exposes it as associated async
/// functions taking a `PgPool`.
///
/// - `user`: accounts, including invitation placeholders
/// - `project`: projects and their owner
/// - `project_member`: role-bearing memberships (never the owner)
/// - `sprint`: project-scoped sprints
/// - `role`: `MemberRole` (stored) and `ProjectRole` (effective)
///
/// # Example
///
/// ```no_run
/// use sprintboard_shared::models::project::{CreateProject, Project};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), sqlx::Error> {
/// let project = Project::create(&pool, CreateProject {
///     owner_id,
///     name: "Apollo".to_string(),
///     description: None,
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod project;
pub mod project_member;
pub mod role;
pub mod sprint;
pub mod user;
