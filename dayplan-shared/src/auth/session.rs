/// The session manager
///
/// Sessions are a state machine over the user's single refresh-token slot:
///
/// ```text
/// NO_SESSION (slot empty)
///     │ issue (login/register)
///     ▼
/// ACTIVE (slot = T) ──rotate──▶ ACTIVE (slot = T')
///     │ revoke (logout)
///     ▼
/// NO_SESSION
/// ```
///
/// Issuing overwrites whatever was in the slot, so logging in on a second
/// device silently ends the first device's ability to refresh. Rotation
/// swaps the slot atomically against the presented token, which makes a
/// replayed (already rotated out) refresh token detectable.
///
/// Access-token authentication is stateless: the slot is never consulted,
/// so an access token issued before logout keeps working until it expires.
/// That staleness window is accepted by design.
///
/// # Example
///
/// ```no_run
/// use chrono::Duration;
/// use dayplan_shared::auth::session::{SessionConfig, SessionManager};
/// use dayplan_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user: User) -> Result<(), Box<dyn std::error::Error>> {
/// let sessions = SessionManager::new(SessionConfig {
///     access_secret: "access-secret-key-at-least-32-bytes!!".to_string(),
///     refresh_secret: "refresh-secret-key-at-least-32-byte!!".to_string(),
///     access_ttl: Duration::hours(1),
///     refresh_ttl: Duration::days(7),
/// });
///
/// let pair = sessions.issue(&pool, &user).await?;
/// let (new_pair, user) = sessions.rotate(&pool, Some(&pair.refresh_token)).await?;
/// sessions.revoke(&pool, user.id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::Duration;
use serde::Serialize;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::jwt::{
    create_access_token, create_refresh_token, validate_access_token, validate_refresh_token,
    JwtError,
};
use crate::models::user::User;

/// Error type for session operations
///
/// Everything except `Database` maps to a 401 at the API boundary.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No refresh token was presented
    #[error("no refresh token provided")]
    MissingToken,

    /// Signature, expiry, or shape check failed
    #[error("invalid or expired token")]
    InvalidToken(#[from] JwtError),

    /// The token's subject no longer exists
    #[error("user not found")]
    UnknownUser,

    /// Presented refresh token is not the currently stored one
    ///
    /// Either the token was already rotated out (possible replay) or the
    /// session was revoked.
    #[error("refresh token is expired, used, or invalid")]
    TokenMismatch,

    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Signing secrets and lifetimes for the two token kinds
///
/// Built once at startup from the application configuration and injected
/// into the manager; nothing here is read from the environment directly.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret for access-token signatures
    pub access_secret: String,

    /// Secret for refresh-token signatures (must differ from the access secret)
    pub refresh_secret: String,

    /// Access token lifetime (short; default 1 hour)
    pub access_ttl: Duration,

    /// Refresh token lifetime (long; default 7 days)
    pub refresh_ttl: Duration,
}

/// A freshly issued access/refresh token pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Short-lived credential for request authentication
    pub access_token: String,

    /// Long-lived credential for obtaining the next pair
    pub refresh_token: String,
}

/// Issues, rotates, revokes, and checks sessions
#[derive(Debug, Clone)]
pub struct SessionManager {
    config: SessionConfig,
}

impl SessionManager {
    /// Creates a session manager from its configuration
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    fn sign_pair(&self, user: &User) -> Result<TokenPair, JwtError> {
        let access_token = create_access_token(
            user.id,
            &user.email,
            &user.username,
            &self.config.access_secret,
            self.config.access_ttl,
        )?;

        let refresh_token =
            create_refresh_token(user.id, &self.config.refresh_secret, self.config.refresh_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Issues a new token pair and stores the refresh token
    ///
    /// Overwrites any previously stored refresh token: one active session
    /// per user.
    pub async fn issue(&self, pool: &PgPool, user: &User) -> Result<TokenPair, SessionError> {
        let pair = self.sign_pair(user)?;

        User::store_refresh_token(pool, user.id, &pair.refresh_token).await?;

        debug!(user_id = %user.id, "Issued new session token pair");
        Ok(pair)
    }

    /// Rotates a refresh token into a brand-new pair
    ///
    /// The full ladder of checks, in order:
    ///
    /// 1. A token must be present ([`SessionError::MissingToken`])
    /// 2. Its signature and expiry must verify ([`SessionError::InvalidToken`])
    /// 3. Its subject must still exist ([`SessionError::UnknownUser`])
    /// 4. It must byte-equal the stored token ([`SessionError::TokenMismatch`]) —
    ///    this is the replay defense, not a staleness nicety
    ///
    /// The new refresh token is written with a conditional swap against the
    /// presented one; losing that race also surfaces as `TokenMismatch`.
    pub async fn rotate(
        &self,
        pool: &PgPool,
        incoming: Option<&str>,
    ) -> Result<(TokenPair, User), SessionError> {
        let incoming = incoming.filter(|t| !t.is_empty()).ok_or(SessionError::MissingToken)?;

        let claims = validate_refresh_token(incoming, &self.config.refresh_secret)?;

        let user = User::find_by_id(pool, claims.sub)
            .await?
            .ok_or(SessionError::UnknownUser)?;

        match user.refresh_token.as_deref() {
            Some(stored) if stored == incoming => {}
            _ => {
                debug!(user_id = %user.id, "Refresh token mismatch (rotated out or revoked)");
                return Err(SessionError::TokenMismatch);
            }
        }

        let pair = self.sign_pair(&user)?;

        let swapped =
            User::rotate_refresh_token(pool, user.id, incoming, &pair.refresh_token).await?;
        if !swapped {
            // A concurrent rotation got there first
            return Err(SessionError::TokenMismatch);
        }

        debug!(user_id = %user.id, "Rotated session token pair");
        Ok((pair, user))
    }

    /// Revokes the user's session (logout); idempotent
    pub async fn revoke(&self, pool: &PgPool, user_id: Uuid) -> Result<(), SessionError> {
        User::clear_refresh_token(pool, user_id).await?;

        debug!(user_id = %user_id, "Revoked session");
        Ok(())
    }

    /// Authenticates an access token, returning its user
    ///
    /// Validates the signature and expiry, then looks up the subject. The
    /// refresh-token slot is deliberately not consulted.
    pub async fn authenticate(&self, pool: &PgPool, token: &str) -> Result<User, SessionError> {
        let claims = validate_access_token(token, &self.config.access_secret)?;

        User::find_by_id(pool, claims.sub)
            .await?
            .ok_or(SessionError::UnknownUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig {
            access_secret: "access-secret-key-at-least-32-bytes!!".to_string(),
            refresh_secret: "refresh-secret-key-at-least-32-byte!!".to_string(),
            access_ttl: Duration::hours(1),
            refresh_ttl: Duration::days(7),
        }
    }

    fn sample_user() -> User {
        use chrono::Utc;

        User {
            id: Uuid::new_v4(),
            fullname: "Test Person".to_string(),
            username: "testperson".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "irrelevant".to_string(),
            refresh_token: None,
            profile_picture_url: None,
            tasks_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_sign_pair_produces_distinct_tokens() {
        let manager = SessionManager::new(config());
        let user = sample_user();

        let pair = manager.sign_pair(&user).expect("Should sign");
        assert_ne!(pair.access_token, pair.refresh_token);
    }

    #[test]
    fn test_signed_access_token_carries_identity() {
        let manager = SessionManager::new(config());
        let user = sample_user();

        let pair = manager.sign_pair(&user).expect("Should sign");
        let claims = validate_access_token(&pair.access_token, &config().access_secret)
            .expect("Should validate");

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.username, user.username);
    }

    #[test]
    fn test_signed_refresh_token_carries_only_subject() {
        let manager = SessionManager::new(config());
        let user = sample_user();

        let pair = manager.sign_pair(&user).expect("Should sign");
        let claims = validate_refresh_token(&pair.refresh_token, &config().refresh_secret)
            .expect("Should validate");

        assert_eq!(claims.sub, user.id);
    }

    #[tokio::test]
    async fn test_rotate_without_token_is_missing_token() {
        let manager = SessionManager::new(config());

        // No pool interaction happens before the presence check, so a lazy
        // (unconnected) pool is enough here.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/unused")
            .expect("lazy pool");

        let result = manager.rotate(&pool, None).await;
        assert!(matches!(result.unwrap_err(), SessionError::MissingToken));

        let result = manager.rotate(&pool, Some("")).await;
        assert!(matches!(result.unwrap_err(), SessionError::MissingToken));
    }

    #[tokio::test]
    async fn test_rotate_with_garbage_token_is_invalid() {
        let manager = SessionManager::new(config());
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/unused")
            .expect("lazy pool");

        let result = manager.rotate(&pool, Some("not-a-jwt")).await;
        assert!(matches!(result.unwrap_err(), SessionError::InvalidToken(_)));
    }
}
