/// Project endpoints
///
/// - `GET    /v1/projects`: projects the caller owns or belongs to
/// - `POST   /v1/projects`: create a project owned by the caller
/// - `GET    /v1/projects/:id`: any role
/// - `PATCH  /v1/projects/:id`: owner only
/// - `DELETE /v1/projects/:id`: owner only; members and sprints go with it
///
/// Every project in a response carries the caller's effective `role`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer};
use sprintboard_shared::{
    auth::{authorization, identity::CurrentUser},
    models::{
        project::{CreateProject, ProjectWithRole, UpdateProject},
        role::ProjectRole,
    },
};
use uuid::Uuid;

pub const MAX_NAME_LENGTH: usize = 200;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,

    /// Absent leaves the description alone; `null` or blank clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`)
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn validate_name(name: &str) -> ApiResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ApiError::invalid_field("name", "Name is required"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::invalid_field(
            "name",
            format!("Name must be at most {MAX_NAME_LENGTH} characters"),
        ));
    }

    Ok(name.to_string())
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

pub async fn list_projects(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<ProjectWithRole>>> {
    Ok(Json(state.store.list_projects_for_user(user.id).await?))
}

/// Create a project
///
/// ```text
/// POST /v1/projects
///
/// { "name": "Apollo", "description": "Moon landing" }
/// ```
///
/// Responds `201 Created` with the project and `"role": "OWNER"`.
pub async fn create_project(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProjectWithRole>)> {
    let Json(req) = payload?;
    let name = validate_name(req.name.as_deref().unwrap_or_default())?;

    let project = state
        .store
        .create_project(CreateProject {
            owner_id: user.id,
            name,
            description: clean_description(req.description),
        })
        .await?;

    tracing::info!(project_id = %project.id, owner_id = %user.id, "Project created");

    Ok((
        StatusCode::CREATED,
        Json(ProjectWithRole {
            project,
            role: ProjectRole::Owner,
        }),
    ))
}

pub async fn get_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectWithRole>> {
    let role = authorization::require_access(state.store.as_ref(), user.id, project_id).await?;

    let project = state
        .store
        .find_project(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(ProjectWithRole { project, role }))
}

/// Rename or re-describe a project
///
/// An empty body returns the project unchanged.
pub async fn update_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
    payload: Result<Json<UpdateProjectRequest>, JsonRejection>,
) -> ApiResult<Json<ProjectWithRole>> {
    let role = authorization::require_ownership(state.store.as_ref(), user.id, project_id).await?;
    let Json(req) = payload?;

    let update = UpdateProject {
        name: req.name.as_deref().map(validate_name).transpose()?,
        description: req.description.map(clean_description),
    };

    let project = if update.is_empty() {
        state.store.find_project(project_id).await?
    } else {
        state.store.update_project(project_id, update).await?
    }
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(ProjectWithRole { project, role }))
}

pub async fn delete_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    authorization::require_ownership(state.store.as_ref(), user.id, project_id).await?;

    if !state.store.delete_project(project_id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    tracing::info!(%project_id, owner_id = %user.id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}
