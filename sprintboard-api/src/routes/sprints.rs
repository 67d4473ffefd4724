/// Sprint endpoints
///
/// - `GET    /v1/projects/:id/sprints`: newest first
/// - `POST   /v1/projects/:id/sprints`
/// - `PATCH  /v1/projects/:id/sprints/:sprint_id`
/// - `DELETE /v1/projects/:id/sprints/:sprint_id`
///
/// Any role on the project may manage its sprints. Sprint ids are always
/// looked up within the path's project, so a sprint of another project is a
/// 404 even for a caller with access to both.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sprintboard_shared::{
    auth::{authorization, identity::CurrentUser},
    dates,
    models::sprint::{dates_in_order, CreateSprint, Sprint, UpdateSprint},
};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct SprintRequest {
    pub title: Option<String>,
    /// `DD-MM-YYYY`, `YYYY-MM-DD` or RFC 3339
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum DateField {
    Start,
    End,
}

impl DateField {
    fn invalid(self) -> ApiError {
        let label = match self {
            DateField::Start => "start",
            DateField::End => "end",
        };
        ApiError::BadRequest(format!(
            "Invalid {label} date format. Use DD-MM-YYYY or ISO format"
        ))
    }
}

fn parse_title(title: &str) -> ApiResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    Ok(title.to_string())
}

fn parse_date_field(input: Option<&str>, field: DateField) -> ApiResult<Option<DateTime<Utc>>> {
    match input {
        Some(raw) => dates::parse_date(raw).map_err(|_| field.invalid()),
        None => Ok(None),
    }
}

fn ensure_range(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> ApiResult<()> {
    if !dates_in_order(start, end) {
        return Err(ApiError::BadRequest(
            "Start date cannot be after end date".to_string(),
        ));
    }
    Ok(())
}

fn sprint_not_found() -> ApiError {
    ApiError::NotFound("Sprint not found".to_string())
}

pub async fn list_sprints(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Sprint>>> {
    authorization::require_access(state.store.as_ref(), user.id, project_id).await?;

    Ok(Json(state.store.list_sprints(project_id).await?))
}

/// Create a sprint
///
/// ```text
/// POST /v1/projects/:id/sprints
///
/// { "title": "Sprint 1", "start_date": "02-03-2026", "end_date": "2026-03-16" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing title, unparseable date, start after end
/// - `404 Not Found`: project missing or invisible to the caller
/// - `409 Conflict`: a sprint with this title already exists in the project
pub async fn create_sprint(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
    payload: Result<Json<SprintRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Sprint>)> {
    authorization::require_access(state.store.as_ref(), user.id, project_id).await?;
    let Json(req) = payload?;

    let title = parse_title(req.title.as_deref().unwrap_or_default())?;
    let start_date = parse_date_field(req.start_date.as_deref(), DateField::Start)?;
    let end_date = parse_date_field(req.end_date.as_deref(), DateField::End)?;
    ensure_range(start_date, end_date)?;

    let sprint = state
        .store
        .create_sprint(CreateSprint {
            project_id,
            title,
            start_date,
            end_date,
        })
        .await?;

    tracing::info!(%project_id, sprint_id = %sprint.id, created_by = %user.id, "Sprint created");

    Ok((StatusCode::CREATED, Json(sprint)))
}

/// Update any subset of title, start date and end date
///
/// The date order is checked against the sprint as it will look after the
/// update, so moving only the start past the stored end is rejected.
pub async fn update_sprint(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, sprint_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<SprintRequest>, JsonRejection>,
) -> ApiResult<Json<Sprint>> {
    authorization::require_access(state.store.as_ref(), user.id, project_id).await?;
    let Json(req) = payload?;

    let update = UpdateSprint {
        title: req.title.as_deref().map(parse_title).transpose()?,
        start_date: parse_date_field(req.start_date.as_deref(), DateField::Start)?,
        end_date: parse_date_field(req.end_date.as_deref(), DateField::End)?,
    };

    if update.is_empty() {
        return Err(ApiError::BadRequest("No valid fields to update".to_string()));
    }

    let current = state
        .store
        .find_sprint(project_id, sprint_id)
        .await?
        .ok_or_else(sprint_not_found)?;

    let merged = update.apply_to(&current);
    ensure_range(merged.start_date, merged.end_date)?;

    let sprint = state
        .store
        .update_sprint(project_id, sprint_id, update)
        .await?
        .ok_or_else(sprint_not_found)?;

    tracing::debug!(%project_id, %sprint_id, updated_by = %user.id, "Sprint updated");

    Ok(Json(sprint))
}

pub async fn delete_sprint(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, sprint_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    authorization::require_access(state.store.as_ref(), user.id, project_id).await?;

    if !state.store.delete_sprint(project_id, sprint_id).await? {
        return Err(sprint_not_found());
    }

    tracing::info!(%project_id, %sprint_id, deleted_by = %user.id, "Sprint deleted");

    Ok(StatusCode::NO_CONTENT)
}
