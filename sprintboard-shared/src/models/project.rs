/// Projects
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(200) NOT NULL,
///     description TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Ownership is a direct foreign key and is never transferred. The owner has
/// no row in `project_members`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::role::ProjectRole;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,

    /// The user who created the project
    pub owner_id: Uuid,

    pub name: String,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Partial update; `None` leaves a field untouched
///
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl UpdateProject {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// A project together with the caller's effective role on it
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithRole {
    #[serde(flatten)]
    pub project: Project,
    pub role: ProjectRole,
}

#[derive(sqlx::FromRow)]
struct ProjectWithRoleRow {
    #[sqlx(flatten)]
    project: Project,
    role: String,
}

const PROJECT_COLUMNS: &str = "id, owner_id, name, description, created_at, updated_at";

impl Project {
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (owner_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(data.owner_id)
        .bind(data.name)
        .bind(data.description)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Owner of a project, or `None` if the project does not exist
    pub async fn owner_id(pool: &PgPool, id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT owner_id FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Projects the user owns or belongs to, most recently updated first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ProjectWithRole>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ProjectWithRoleRow>(
            r#"
            SELECT p.id, p.owner_id, p.name, p.description, p.created_at, p.updated_at,
                   CASE WHEN p.owner_id = $1 THEN 'OWNER' ELSE m.role::text END AS role
            FROM projects p
            LEFT JOIN project_members m ON m.project_id = p.id AND m.user_id = $1
            WHERE p.owner_id = $1 OR m.user_id = $1
            ORDER BY p.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let role = row
                    .role
                    .parse::<ProjectRole>()
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
                Ok(ProjectWithRole {
                    project: row.project,
                    role,
                })
            })
            .collect()
    }

    /// Applies a partial update and bumps `updated_at`
    ///
    /// Returns `None` if the project does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let (set_description, description) = match data.description {
            Some(description) => (true, description),
            None => (false, None),
        };

        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.name)
        .bind(set_description)
        .bind(description)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a project; members and sprints cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
