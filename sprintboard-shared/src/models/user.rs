/// User accounts
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255),
///     name VARCHAR(255),
///     image VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// A user without `password_hash` is a placeholder created when someone
/// invited an email address that had no account yet. Registering with that
/// address claims the placeholder (see [`User::claim`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, unique case-insensitively
    pub email: String,

    /// Argon2id hash; `None` for invited placeholder accounts
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,

    /// Optional display name
    pub name: Option<String>,

    /// Optional avatar URL
    pub image: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// True for invited accounts nobody has registered yet
    pub fn is_placeholder(&self) -> bool {
        self.password_hash.is_none()
    }
}

/// Input for creating a user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address; callers normalize to lowercase
    pub email: String,

    /// Argon2id hash, or `None` for an invitation placeholder
    pub password_hash: Option<String>,

    pub name: Option<String>,

    pub image: Option<String>,
}

const USER_COLUMNS: &str = "id, email::text AS email, password_hash, name, image, created_at, updated_at";

impl User {
    /// Inserts a user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` when the email is
    /// already taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, name, image)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.name)
        .bind(data.image)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup (CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1::citext"))
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Sets a password on a placeholder account
    ///
    /// Returns `None` if the user does not exist or already has a password,
    /// so two concurrent registrations cannot both claim the same account.
    /// Email ownership is not checked.
    pub async fn claim(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
        name: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET password_hash = $2,
                name = COALESCE($3, name),
                updated_at = NOW()
            WHERE id = $1 AND password_hash IS NULL
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(password_hash)
        .bind(name)
        .fetch_optional(pool)
        .await
    }
}
