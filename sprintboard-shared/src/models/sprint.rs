/// Sprints
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sprints (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     start_date TIMESTAMPTZ,
///     end_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT sprints_project_id_title_key UNIQUE (project_id, title)
/// );
/// ```
///
/// Every query takes the project id as well as the sprint id, so a sprint can
/// never be read or changed through another project's route.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sprint {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// True unless both dates are present and `start > end`
pub fn dates_in_order(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => start <= end,
        _ => true,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSprint {
    pub project_id: Uuid,
    pub title: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Partial update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSprint {
    pub title: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl UpdateSprint {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }

    /// The sprint as it would look after this update
    pub fn apply_to(&self, sprint: &Sprint) -> Sprint {
        Sprint {
            title: self.title.clone().unwrap_or_else(|| sprint.title.clone()),
            start_date: self.start_date.or(sprint.start_date),
            end_date: self.end_date.or(sprint.end_date),
            ..sprint.clone()
        }
    }
}

const SPRINT_COLUMNS: &str = "id, project_id, title, start_date, end_date, created_at, updated_at";

impl Sprint {
    /// # Errors
    ///
    /// Unique violation on `sprints_project_id_title_key` for a duplicate
    /// title within the project.
    pub async fn create(pool: &PgPool, data: CreateSprint) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Sprint>(&format!(
            r#"
            INSERT INTO sprints (project_id, title, start_date, end_date)
            VALUES ($1, $2, $3, $4)
            RETURNING {SPRINT_COLUMNS}
            "#
        ))
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_one(pool)
        .await
    }

    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Sprint>(&format!(
            "SELECT {SPRINT_COLUMNS} FROM sprints WHERE id = $1 AND project_id = $2"
        ))
        .bind(id)
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    /// Newest first
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Sprint>(&format!(
            "SELECT {SPRINT_COLUMNS} FROM sprints WHERE project_id = $1 ORDER BY created_at DESC"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        project_id: Uuid,
        id: Uuid,
        data: UpdateSprint,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Sprint>(&format!(
            r#"
            UPDATE sprints
            SET title = COALESCE($3, title),
                start_date = COALESCE($4, start_date),
                end_date = COALESCE($5, end_date),
                updated_at = NOW()
            WHERE id = $1 AND project_id = $2
            RETURNING {SPRINT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(project_id)
        .bind(data.title)
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, project_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sprints WHERE id = $1 AND project_id = $2")
            .bind(id)
            .bind(project_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sprint() -> Sprint {
        Sprint {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Sprint 1".to_string(),
            start_date: Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 0).unwrap()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_dates_in_order() {
        let early = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();

        assert!(dates_in_order(Some(early), Some(late)));
        assert!(dates_in_order(Some(early), Some(early)));
        assert!(!dates_in_order(Some(late), Some(early)));
        assert!(dates_in_order(None, Some(early)));
        assert!(dates_in_order(Some(late), None));
    }

    #[test]
    fn test_apply_update_merges_fields() {
        let original = sprint();
        let moved_end = Utc.with_ymd_and_hms(2026, 1, 20, 0, 0, 0).unwrap();
        let update = UpdateSprint {
            end_date: Some(moved_end),
            ..Default::default()
        };

        let merged = update.apply_to(&original);
        assert_eq!(merged.title, original.title);
        assert_eq!(merged.start_date, original.start_date);
        assert_eq!(merged.end_date, Some(moved_end));

        // End now precedes start
        assert!(!dates_in_order(merged.start_date, merged.end_date));
    }

    #[test]
    fn test_update_sprint_is_empty() {
        assert!(UpdateSprint::default().is_empty());
        assert!(!UpdateSprint {
            title: Some("Renamed".to_string()),
            ..Default::default()
        }
        .is_empty());
    }
}
