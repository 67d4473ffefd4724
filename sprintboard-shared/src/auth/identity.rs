/// Request identity
///
/// The API's authentication layer validates the session token, re-loads the
/// user and stores a [`CurrentUser`] in the request extensions. Handlers take
/// `CurrentUser` as an extractor; on routes the layer did not cover the
/// extractor rejects with 401.
///
/// # Example
///
/// ```no_run
/// use sprintboard_shared::auth::identity::CurrentUser;
///
/// async fn whoami(user: CurrentUser) -> String {
///     format!("Hello, {}!", user.email)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{auth::jwt::JwtError, models::user::User};

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl CurrentUser {
    /// Inviter name for emails: display name, falling back to the email
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            image: user.image,
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    /// No bearer header and no session cookie
    MissingCredentials,

    /// Bad signature, expired, wrong type, or the user no longer exists
    InvalidToken(String),

    /// Identity could not be loaded
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing credentials".to_string(),
            ),
            AuthError::InvalidToken(message) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", message)
            }
            AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(_) => AuthError::Internal,
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            _ => AuthError::InvalidToken(err.to_string()),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn ada() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            name: None,
            image: None,
        }
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut user = ada();
        assert_eq!(user.display_name(), "ada@example.com");

        user.name = Some("Ada".to_string());
        assert_eq!(user.display_name(), "Ada");
    }

    #[tokio::test]
    async fn test_extractor_reads_extension() {
        let user = ada();
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(user.clone());

        let extracted = CurrentUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, user);
    }

    #[tokio::test]
    async fn test_extractor_rejects_without_identity() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();

        let rejection = CurrentUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            AuthError::InvalidToken("Token expired".to_string())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_from_jwt_error() {
        assert!(matches!(
            AuthError::from(JwtError::Expired),
            AuthError::InvalidToken(msg) if msg == "Token expired"
        ));
        assert!(matches!(
            AuthError::from(JwtError::WrongTokenType { expected: "access", actual: "refresh" }),
            AuthError::InvalidToken(msg) if msg == "Expected access token, got refresh token"
        ));
        assert!(matches!(
            AuthError::from(JwtError::CreateError("key".to_string())),
            AuthError::Internal
        ));
    }
}
