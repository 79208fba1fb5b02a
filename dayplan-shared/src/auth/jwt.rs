/// Signed token creation and validation
///
/// Two token kinds, signed with HS256 under **distinct secrets**:
///
/// - **Access token**: short-lived, carries the user's id, email, and
///   username so a request can be served without a session lookup.
/// - **Refresh token**: long-lived, carries only the user's id, and is only
///   good for obtaining a fresh pair via the session manager.
///
/// Because the secrets differ, a refresh token presented where an access
/// token is expected fails signature verification outright; the claim
/// shapes differ as well.
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use dayplan_shared::auth::jwt::{create_access_token, validate_access_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let secret = "access-secret-key-at-least-32-bytes!!";
///
/// let token = create_access_token(
///     user_id,
///     "user@example.com",
///     "username",
///     secret,
///     Duration::hours(1),
/// )?;
///
/// let claims = validate_access_token(&token, secret)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token issuer claim value
const ISSUER: &str = "dayplan";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, issuer, or shape check failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,
}

/// Claims carried by an access token
///
/// Self-contained: everything a handler needs to identify the caller is in
/// the token, so authentication between issuance and expiry never touches
/// the refresh-token slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject - user ID
    pub sub: Uuid,

    /// User's email at issuance time
    pub email: String,

    /// User's username at issuance time
    pub username: String,

    /// Issuer - always "dayplan"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Claims carried by a refresh token
///
/// The subject plus a unique token id. The `jti` guarantees two refresh
/// tokens are never byte-identical even when signed within the same second,
/// which the stored-token equality check depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Unique token id
    pub jti: Uuid,

    /// Issuer - always "dayplan"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Creates a signed access token
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    username: &str,
    secret: &str,
    ttl: Duration,
) -> Result<String, JwtError> {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user_id,
        email: email.to_string(),
        username: username.to_string(),
        iss: ISSUER.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    sign(&claims, secret)
}

/// Creates a signed refresh token
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_refresh_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, JwtError> {
    let now = Utc::now();
    let claims = RefreshClaims {
        sub: user_id,
        jti: Uuid::new_v4(),
        iss: ISSUER.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    sign(&claims, secret)
}

/// Validates an access token and extracts its claims
///
/// Verifies the signature against the access secret, the expiry, and the
/// issuer.
///
/// # Errors
///
/// `JwtError::Expired` for an out-of-date token, `JwtError::ValidationError`
/// for every other rejection (bad signature, wrong issuer, wrong shape).
pub fn validate_access_token(token: &str, secret: &str) -> Result<AccessClaims, JwtError> {
    verify::<AccessClaims>(token, secret)
}

/// Validates a refresh token and extracts its claims
///
/// # Errors
///
/// As for [`validate_access_token`], against the refresh secret.
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<RefreshClaims, JwtError> {
    verify::<RefreshClaims>(token, secret)
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

fn verify<T: serde::de::DeserializeOwned>(token: &str, secret: &str) -> Result<T, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;

    let token_data = decode::<T>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
