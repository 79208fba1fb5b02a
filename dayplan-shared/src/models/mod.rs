/// Database models for Dayplan
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, credentials, and the refresh-token session slot
/// - `task`: Daily schedule entries with overlap enforcement
/// - `completion`: Per-task per-day completion records
///
/// # Example
///
/// ```no_run
/// use dayplan_shared::models::user::{CreateUser, User};
/// use dayplan_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     fullname: "Jordan Example".to_string(),
///     username: "jordan".to_string(),
///     email: "jordan@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod completion;
pub mod task;
pub mod user;
