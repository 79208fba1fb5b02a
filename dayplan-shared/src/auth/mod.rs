/// Authentication primitives for Dayplan
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Signed access/refresh token creation and validation
/// - [`session`]: The session manager — issues, rotates, and revokes the
///   per-user token pair and authenticates access tokens
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Tokens**: HS256-signed JWTs; access and refresh tokens use distinct
///   secrets and distinct expiries
/// - **Rotation**: one active refresh token per user, swapped atomically on
///   each refresh so a replayed stale token is rejected
///
/// # Example
///
/// ```no_run
/// use dayplan_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
pub mod session;
