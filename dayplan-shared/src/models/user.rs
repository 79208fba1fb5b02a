/// User model and database operations
///
/// This module provides the User model and the queries behind registration,
/// profile management, and the session slot.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     fullname VARCHAR(255) NOT NULL,
///     username VARCHAR(64) NOT NULL UNIQUE,
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     refresh_token TEXT,
///     profile_picture_url VARCHAR(512),
///     tasks_count INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The `refresh_token` column is the single active session slot per user:
/// logging in overwrites it, logging out clears it, and token rotation
/// replaces it only when the presented token still matches the stored one.
///
/// # Example
///
/// ```no_run
/// use dayplan_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     fullname: "Jordan Example".to_string(),
///     username: "jordan".to_string(),
///     email: "jordan@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let found = User::find_by_email(&pool, "jordan@example.com").await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, fullname, username, email, password_hash, refresh_token, \
     profile_picture_url, tasks_count, created_at, updated_at";

/// User model representing an account
///
/// Deliberately does not derive `Serialize`: the record carries the password
/// hash and the refresh-token slot, neither of which may leave the process.
/// Use [`User::public`] for anything that ends up in a response body.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub fullname: String,

    /// Unique handle
    pub username: String,

    /// Email address, stored lowercase (case-insensitive via CITEXT)
    pub email: String,

    /// Argon2id password hash (PHC string format)
    pub password_hash: String,

    /// Currently active refresh token, if a session exists
    pub refresh_token: Option<String>,

    /// Optional profile picture URL
    pub profile_picture_url: Option<String>,

    /// Number of tasks this user owns, maintained by the task store
    pub tasks_count: i32,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// The externally visible view of a user
///
/// Everything in here is safe to hand to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub fullname: String,
    pub username: String,
    pub email: String,
    pub profile_picture_url: Option<String>,
    pub tasks_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Display name
    pub fullname: String,

    /// Unique handle
    pub username: String,

    /// Email address (lowercase it before calling [`User::create`])
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password!)
    pub password_hash: String,
}

/// Input for updating the profile fields of an existing user
#[derive(Debug, Clone)]
pub struct UpdateProfile {
    pub fullname: String,
    pub username: String,
    pub email: String,
}

impl User {
    /// Returns the client-safe view of this user
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            fullname: self.fullname.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            profile_picture_url: self.profile_picture_url.clone(),
            tasks_count: self.tasks_count,
            created_at: self.created_at,
        }
    }

    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the username or email is already taken (unique
    /// constraint violation) or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (fullname, username, email, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(data.fullname)
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user holding either the given email or the given username
    ///
    /// Used by registration to report a conflict before attempting the
    /// insert; the unique constraints remain the authoritative guard.
    pub async fn find_by_email_or_username(
        pool: &PgPool,
        email: &str,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR username = $2 LIMIT 1"
        ))
        .bind(email)
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Updates the profile fields (fullname, username, email)
    ///
    /// Returns the updated user, or `None` if the user no longer exists.
    ///
    /// # Errors
    ///
    /// Unique constraint violations (username/email taken by someone else)
    /// surface as database errors for the caller to map.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET fullname = $2, username = $3, email = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(data.fullname)
        .bind(data.username)
        .bind(data.email)
        .fetch_optional(pool)
        .await
    }

    /// Replaces the stored password hash
    ///
    /// Returns true if the user was found and updated.
    pub async fn set_password_hash(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stores a refresh token, overwriting any prior value
    ///
    /// This is the "login elsewhere logs you out here" behavior: one active
    /// refresh token per user.
    pub async fn store_refresh_token(
        pool: &PgPool,
        id: Uuid,
        token: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Atomically swaps the stored refresh token during rotation
    ///
    /// The write only happens if the stored token still equals `previous`,
    /// so two concurrent rotations with the same token cannot both succeed.
    /// Returns true if this call won the swap.
    pub async fn rotate_refresh_token(
        pool: &PgPool,
        id: Uuid,
        previous: &str,
        next: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $3, updated_at = NOW()
             WHERE id = $1 AND refresh_token = $2",
        )
        .bind(id)
        .bind(previous)
        .bind(next)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Clears the refresh-token slot (logout); idempotent
    pub async fn clear_refresh_token(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET refresh_token = NULL, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Sets the profile picture URL
    ///
    /// Returns the updated user, or `None` if the user no longer exists.
    pub async fn set_profile_picture(
        pool: &PgPool,
        id: Uuid,
        url: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET profile_picture_url = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(url)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            fullname: "Test Person".to_string(),
            username: "testperson".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$v=19$m=65536,t=3,p=4$c2FsdA$aGFzaA".to_string(),
            refresh_token: Some("some-refresh-token".to_string()),
            profile_picture_url: None,
            tasks_count: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_public_view_carries_profile_fields() {
        let user = sample_user();
        let public = user.public();

        assert_eq!(public.id, user.id);
        assert_eq!(public.username, "testperson");
        assert_eq!(public.email, "test@example.com");
        assert_eq!(public.tasks_count, 3);
    }

    #[test]
    fn test_public_view_serialization_has_no_secrets() {
        let user = sample_user();
        let json = serde_json::to_value(user.public()).expect("serialize");

        assert!(json.get("password_hash").is_none());
        assert!(json.get("refresh_token").is_none());
        assert_eq!(json["username"], "testperson");
    }
}
