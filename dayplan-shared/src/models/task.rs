/// Task model and database operations
///
/// A task is a named block of time on a calendar day: a half-open interval
/// `[start_time, end_time)` anchored to `date`, plus a priority and a
/// recurrence label. Tasks belonging to one user must not overlap on the
/// same day; touching endpoints (one task ending exactly when the next
/// starts) are allowed.
///
/// The overlap check and the subsequent insert/update run inside a single
/// transaction that holds a per-owner advisory lock, so two concurrent
/// writes for the same owner serialize and cannot both slip past the check.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('high', 'medium', 'low');
/// CREATE TYPE task_recurrence AS ENUM ('daily', 'weekly', 'custom', 'none');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     date DATE NOT NULL,
///     start_time TIME NOT NULL,
///     end_time TIME NOT NULL,
///     recurrence task_recurrence NOT NULL DEFAULT 'daily',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT tasks_window_valid CHECK (end_time > start_time)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use chrono::{NaiveTime, Utc};
/// use dayplan_shared::models::task::{CreateTask, Priority, Recurrence, Task};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let task = Task::create(&pool, CreateTask {
///     user_id: owner,
///     name: "Morning review".to_string(),
///     description: None,
///     priority: Priority::High,
///     date: Utc::now().date_naive(),
///     start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///     end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
///     recurrence: Recurrence::Daily,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, user_id, name, description, priority, date, start_time, end_time, \
     recurrence, created_at, updated_at";

/// Error type for task store operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Referenced task does not exist
    #[error("task not found")]
    NotFound,

    /// Task exists but belongs to another user
    #[error("task belongs to another user")]
    NotOwner,

    /// End time is not strictly after start time
    #[error("end time must be after start time")]
    InvalidWindow,

    /// Requested window collides with existing tasks for the same owner/day
    #[error("time window overlaps {} existing task(s)", .0.len())]
    Overlap(Vec<TimeConflict>),

    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One conflicting task, formatted for client display
#[derive(Debug, Clone, Serialize)]
pub struct TimeConflict {
    /// Name of the existing task
    pub name: String,

    /// Its window as "HH:mm - HH:mm"
    pub time: String,
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Recurrence label
///
/// Recurrence is stored and echoed back; nothing in the system expands a
/// task across future dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_recurrence", rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Custom,
    None,
}

impl Default for Recurrence {
    fn default() -> Self {
        Recurrence::Daily
    }
}

/// Task model representing one scheduled block of time
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Human-readable task name
    pub name: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Priority
    pub priority: Priority,

    /// Calendar day this task is anchored to
    pub date: NaiveDate,

    /// Start of the window (inclusive)
    pub start_time: NaiveTime,

    /// End of the window (exclusive)
    pub end_time: NaiveTime,

    /// Recurrence label
    pub recurrence: Recurrence,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub recurrence: Recurrence,
}

/// Input for updating an existing task
///
/// The calendar day is deliberately absent: updates keep the task anchored
/// to its stored date and only move the window within that day.
#[derive(Debug, Clone)]
pub struct UpdateTask {
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub recurrence: Recurrence,
}

/// Parses a wall-clock `HH:mm` display string
///
/// Accepts hours 00-23 and minutes 00-59; anything else (including trailing
/// seconds) is rejected.
pub fn parse_display_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// Formats a time back into its `HH:mm` display form
pub fn format_display_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Half-open interval overlap test
///
/// `[a_start, a_end)` and `[b_start, b_end)` overlap iff each starts before
/// the other ends. Touching endpoints do not overlap.
pub fn windows_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Derives the advisory-lock key for an owner
///
/// `pg_advisory_xact_lock` takes a bigint; the first eight bytes of the
/// owner's UUID give a stable per-owner key.
fn owner_lock_key(user_id: Uuid) -> i64 {
    let bytes = user_id.as_bytes();
    let mut key = [0u8; 8];
    key.copy_from_slice(&bytes[..8]);
    i64::from_be_bytes(key)
}

impl Task {
    /// The task's window as a "HH:mm - HH:mm" display string
    pub fn display_window(&self) -> String {
        format!(
            "{} - {}",
            format_display_time(self.start_time),
            format_display_time(self.end_time)
        )
    }

    fn conflict_entry(&self) -> TimeConflict {
        TimeConflict {
            name: self.name.clone(),
            time: self.display_window(),
        }
    }

    /// Creates a new task, enforcing the non-overlap invariant
    ///
    /// Runs inside a transaction holding the owner's advisory lock: the
    /// overlap check and the insert are atomic with respect to other writes
    /// for the same owner. The owner's `tasks_count` is incremented in the
    /// same transaction.
    ///
    /// # Errors
    ///
    /// - [`TaskError::InvalidWindow`] if `end_time <= start_time`
    /// - [`TaskError::Overlap`] listing every colliding task on that day
    /// - [`TaskError::Database`] on connection or constraint failures
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, TaskError> {
        if data.end_time <= data.start_time {
            return Err(TaskError::InvalidWindow);
        }

        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(owner_lock_key(data.user_id))
            .execute(&mut *tx)
            .await?;

        let conflicts = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE user_id = $1 AND date = $2 AND start_time < $3 AND end_time > $4
             ORDER BY start_time"
        ))
        .bind(data.user_id)
        .bind(data.date)
        .bind(data.end_time)
        .bind(data.start_time)
        .fetch_all(&mut *tx)
        .await?;

        if !conflicts.is_empty() {
            return Err(TaskError::Overlap(
                conflicts.iter().map(Task::conflict_entry).collect(),
            ));
        }

        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (user_id, name, description, priority, date, start_time, end_time, recurrence)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(data.user_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.date)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.recurrence)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET tasks_count = tasks_count + 1, updated_at = NOW() WHERE id = $1")
            .bind(data.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(task)
    }

    /// Updates a task, re-validating the window against its stored day
    ///
    /// The new interval is anchored to the task's existing `date` (only the
    /// time-of-day is editable), and the overlap check is scoped to that day
    /// and excludes the task itself. Same lock/transaction discipline as
    /// [`Task::create`].
    ///
    /// # Errors
    ///
    /// - [`TaskError::NotFound`] if the task does not exist
    /// - [`TaskError::NotOwner`] if it belongs to a different user
    /// - [`TaskError::InvalidWindow`] / [`TaskError::Overlap`] as for create
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        data: UpdateTask,
    ) -> Result<Self, TaskError> {
        if data.end_time <= data.start_time {
            return Err(TaskError::InvalidWindow);
        }

        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(owner_lock_key(owner))
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(TaskError::NotFound)?;

        if existing.user_id != owner {
            return Err(TaskError::NotOwner);
        }

        let conflicts = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE user_id = $1 AND date = $2 AND id <> $3
               AND start_time < $4 AND end_time > $5
             ORDER BY start_time"
        ))
        .bind(owner)
        .bind(existing.date)
        .bind(id)
        .bind(data.end_time)
        .bind(data.start_time)
        .fetch_all(&mut *tx)
        .await?;

        if !conflicts.is_empty() {
            return Err(TaskError::Overlap(
                conflicts.iter().map(Task::conflict_entry).collect(),
            ));
        }

        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET name = $2, description = $3, priority = $4, start_time = $5,
                 end_time = $6, recurrence = $7, updated_at = NOW()
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.recurrence)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(task)
    }

    /// Deletes a task and decrements the owner's task counter
    ///
    /// # Errors
    ///
    /// - [`TaskError::NotFound`] if the task does not exist
    /// - [`TaskError::NotOwner`] if it belongs to a different user
    pub async fn delete(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<(), TaskError> {
        let mut tx = pool.begin().await?;

        let task_owner: Option<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM tasks WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let (task_owner,) = task_owner.ok_or(TaskError::NotFound)?;
        if task_owner != owner {
            return Err(TaskError::NotOwner);
        }

        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE users SET tasks_count = GREATEST(tasks_count - 1, 0), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(owner)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a task and checks it belongs to `owner`
    ///
    /// # Errors
    ///
    /// - [`TaskError::NotFound`] if the task does not exist
    /// - [`TaskError::NotOwner`] if it belongs to a different user
    pub async fn find_owned(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<Self, TaskError> {
        let task = Self::find_by_id(pool, id).await?.ok_or(TaskError::NotFound)?;

        if task.user_id != owner {
            return Err(TaskError::NotOwner);
        }

        Ok(task)
    }

    /// Lists all tasks for an owner, newest first
    pub async fn list_by_owner(pool: &PgPool, owner: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_display_time_valid() {
        assert_eq!(parse_display_time("09:00"), Some(t(9, 0)));
        assert_eq!(parse_display_time("00:00"), Some(t(0, 0)));
        assert_eq!(parse_display_time("23:59"), Some(t(23, 59)));
    }

    #[test]
    fn test_parse_display_time_rejects_garbage() {
        assert!(parse_display_time("24:00").is_none());
        assert!(parse_display_time("09:60").is_none());
        assert!(parse_display_time("nine o'clock").is_none());
        assert!(parse_display_time("09:00:30").is_none());
        assert!(parse_display_time("").is_none());
    }

    #[test]
    fn test_format_display_time() {
        assert_eq!(format_display_time(t(9, 5)), "09:05");
        assert_eq!(format_display_time(t(23, 59)), "23:59");
    }

    #[test]
    fn test_windows_overlap_partial() {
        // 09:00-10:00 vs 09:30-10:30
        assert!(windows_overlap(t(9, 0), t(10, 0), t(9, 30), t(10, 30)));
        assert!(windows_overlap(t(9, 30), t(10, 30), t(9, 0), t(10, 0)));
    }

    #[test]
    fn test_windows_overlap_containment() {
        assert!(windows_overlap(t(9, 0), t(12, 0), t(10, 0), t(11, 0)));
        assert!(windows_overlap(t(10, 0), t(11, 0), t(9, 0), t(12, 0)));
    }

    #[test]
    fn test_windows_back_to_back_do_not_overlap() {
        // A ends exactly when B starts
        assert!(!windows_overlap(t(9, 0), t(10, 0), t(10, 0), t(11, 0)));
        assert!(!windows_overlap(t(10, 0), t(11, 0), t(9, 0), t(10, 0)));
    }

    #[test]
    fn test_windows_disjoint_do_not_overlap() {
        assert!(!windows_overlap(t(8, 0), t(9, 0), t(13, 0), t(14, 0)));
    }

    #[test]
    fn test_owner_lock_key_is_stable() {
        let id = Uuid::new_v4();
        assert_eq!(owner_lock_key(id), owner_lock_key(id));

        let other = Uuid::new_v4();
        // Different UUIDs give different keys except for an astronomically
        // unlikely 8-byte prefix collision.
        assert_ne!(owner_lock_key(id), owner_lock_key(other));
    }

    #[test]
    fn test_priority_and_recurrence_defaults() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Recurrence::default(), Recurrence::Daily);
    }

    #[test]
    fn test_display_window_format() {
        let task = Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Standup".to_string(),
            description: None,
            priority: Priority::Medium,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            start_time: t(9, 0),
            end_time: t(9, 15),
            recurrence: Recurrence::Daily,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(task.display_window(), "09:00 - 09:15");

        let conflict = task.conflict_entry();
        assert_eq!(conflict.name, "Standup");
        assert_eq!(conflict.time, "09:00 - 09:15");
    }
}
