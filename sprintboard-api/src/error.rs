/// Error handling for the API server
///
/// Handlers return [`ApiResult<T>`]; every library error converts into an
/// [`ApiError`] with `?` and renders as
///
/// ```json
/// { "error": "not_found", "message": "Project not found" }
/// ```
///
/// with an optional `details` array for field validation failures.
///
/// # Example
///
/// ```no_run
/// use sprintboard_api::{app::AppState, error::{ApiError, ApiResult}};
/// use axum::{extract::{Path, State}, Json};
/// use sprintboard_shared::{models::project::Project, store::Store};
/// use uuid::Uuid;
///
/// async fn handler(
///     State(state): State<AppState>,
///     Path(id): Path<Uuid>,
/// ) -> ApiResult<Json<Project>> {
///     let project = state
///         .store
///         .find_project(id)
///         .await?
///         .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
///     Ok(Json(project))
/// }
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sprintboard_shared::{
    auth::{authorization::AuthzError, jwt::JwtError, password::PasswordError},
    dates::InvalidDate,
    models::role::InvalidRole,
    store::{StoreError, PROJECT_MEMBERS_PROJECT_USER_KEY, SPRINTS_PROJECT_TITLE_KEY, USERS_EMAIL_KEY},
};
use std::fmt;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// 400
    BadRequest(String),

    /// 401
    Unauthorized(String),

    /// 403
    Forbidden(String),

    /// 404
    NotFound(String),

    /// 409, e.g. duplicate email or membership
    Conflict(String),

    /// 422, field validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// 500; the message is logged, never returned
    InternalError(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable code, e.g. "not_found"
    pub error: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field 422
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Request validation failed".to_string()),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(constraint) => ApiError::Conflict(
                match constraint.as_str() {
                    USERS_EMAIL_KEY => "An account with this email already exists",
                    PROJECT_MEMBERS_PROJECT_USER_KEY => "User is already a member of this project",
                    SPRINTS_PROJECT_TITLE_KEY => "A sprint with this title already exists",
                    _ => "Resource already exists",
                }
                .to_string(),
            ),
            StoreError::ForeignKeyViolation(constraint) => {
                tracing::debug!(%constraint, "Foreign key violation");
                ApiError::NotFound("Referenced resource not found".to_string())
            }
            StoreError::Database(err) => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::ProjectNotFound | AuthzError::MemberNotFound => {
                ApiError::NotFound(err.to_string())
            }
            AuthzError::InsufficientRole { .. } => ApiError::Forbidden(err.to_string()),
            AuthzError::MemberProjectMismatch
            | AuthzError::OwnerImmutable(_)
            | AuthzError::AlreadyOwner => ApiError::BadRequest(err.to_string()),
            AuthzError::Store(err) => err.into(),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooWeak(msg) => ApiError::invalid_field("password", msg),
            _ => ApiError::InternalError(format!("Password operation failed: {}", err)),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => {
                ApiError::InternalError(format!("Token creation failed: {}", msg))
            }
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    ValidationErrorDetail::new(
                        field.to_string(),
                        error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "Validation failed".to_string()),
                    )
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonSyntaxError(_) => ApiError::BadRequest("Invalid JSON body".to_string()),
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::BadRequest("Expected a JSON body".to_string())
            }
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<InvalidRole> for ApiError {
    fn from(_: InvalidRole) -> Self {
        ApiError::BadRequest("Role must be ADMIN, DEVELOPER, or CLIENT".to_string())
    }
}

impl From<InvalidDate> for ApiError {
    fn from(err: InvalidDate) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
