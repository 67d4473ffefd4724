/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and registration strength rules
/// - [`jwt`]: HS256 access/refresh session tokens
/// - [`identity`]: the `CurrentUser` extractor and 401 responses
/// - [`authorization`]: project roles, permission checks and the owner guard
///
/// # Example
///
/// ```no_run
/// use sprintboard_shared::auth::jwt::issue_token_pair;
/// use sprintboard_shared::auth::password::{hash_password, verify_password};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Correct-Horse-9")?;
/// assert!(verify_password("Correct-Horse-9", &hash)?);
///
/// let tokens = issue_token_pair(Uuid::new_v4(), "ada@example.com", "a-secret-of-at-least-32-bytes!!!")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod identity;
pub mod jwt;
pub mod password;
