/// Project memberships
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'DEVELOPER',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT project_members_project_id_user_id_key UNIQUE (project_id, user_id)
/// );
/// ```
///
/// Membership ids are global, so every mutation must also check that the row
/// belongs to the project named in the request. The project owner never has a
/// row here; that is enforced by the invitation flow, not by the schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::role::MemberRole;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectMember {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
}

/// A membership joined with the member's public profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub member: ProjectMember,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

const MEMBER_COLUMNS: &str = "id, project_id, user_id, role, created_at, updated_at";

impl ProjectMember {
    /// Inserts a membership
    ///
    /// # Errors
    ///
    /// - unique violation on `project_members_project_id_user_id_key` if the
    ///   user is already a member
    /// - foreign key violation if the project or user does not exist
    pub async fn create(pool: &PgPool, data: CreateProjectMember) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(&format!(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM project_members WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// The membership of `user_id` on `project_id`, if any
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM project_members WHERE project_id = $1 AND user_id = $2"
        ))
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Members of a project with their profiles, oldest first
    pub async fn list_with_users(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        sqlx::query_as::<_, MemberWithUser>(
            r#"
            SELECT m.id, m.project_id, m.user_id, m.role, m.created_at, m.updated_at,
                   u.email::text AS email, u.name, u.image
            FROM project_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Returns `None` if the membership does not exist
    pub async fn update_role(
        pool: &PgPool,
        id: Uuid,
        role: MemberRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(&format!(
            r#"
            UPDATE project_members
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_members WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
