/// Completion records: per-task, per-day progress tracking
///
/// Each record says "task T was P percent done on day D". The
/// `(task_id, user_id, date)` uniqueness constraint makes marking a task
/// complete an upsert: repeating the call for the same day overwrites the
/// percentage instead of accumulating rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_completions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     date DATE NOT NULL,
///     completion_percentage INTEGER NOT NULL DEFAULT 0
///         CHECK (completion_percentage BETWEEN 0 AND 100),
///     completed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT task_completions_one_per_day UNIQUE (task_id, user_id, date)
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

const COMPLETION_COLUMNS: &str = "id, task_id, user_id, date, completion_percentage, completed_at, \
     created_at, updated_at";

/// One per-day completion record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskCompletion {
    /// Unique record ID
    pub id: Uuid,

    /// Task this record belongs to
    pub task_id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Calendar day the completion applies to
    pub date: NaiveDate,

    /// How complete the task was that day, 0-100
    pub completion_percentage: i32,

    /// When the task was last marked complete for this day
    pub completed_at: Option<DateTime<Utc>>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

/// A completion record joined with its task's name, for history views
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CompletionHistoryEntry {
    /// Completion record ID
    pub id: Uuid,

    /// Task this record belongs to
    pub task_id: Uuid,

    /// The task's current name
    pub task_name: String,

    /// Calendar day the completion applies to
    pub date: NaiveDate,

    /// How complete the task was that day, 0-100
    pub completion_percentage: i32,

    /// When the task was last marked complete for this day
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskCompletion {
    /// Upserts the completion record for `(task_id, user_id, date)`
    ///
    /// Creates the record if the day has none yet; otherwise overwrites the
    /// stored percentage. `completed_at` is refreshed to now either way.
    /// Callers are expected to have validated `percentage` into `[0, 100]`;
    /// the CHECK constraint backstops them.
    pub async fn upsert(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
        percentage: i32,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskCompletion>(&format!(
            "INSERT INTO task_completions (task_id, user_id, date, completion_percentage, completed_at)
             VALUES ($1, $2, $3, $4, NOW())
             ON CONFLICT (task_id, user_id, date)
             DO UPDATE SET completion_percentage = EXCLUDED.completion_percentage,
                           completed_at = NOW(),
                           updated_at = NOW()
             RETURNING {COMPLETION_COLUMNS}"
        ))
        .bind(task_id)
        .bind(user_id)
        .bind(date)
        .bind(percentage)
        .fetch_one(pool)
        .await
    }

    /// Finds the record for one task on one day, if any
    pub async fn find_for_date(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskCompletion>(&format!(
            "SELECT {COMPLETION_COLUMNS} FROM task_completions
             WHERE task_id = $1 AND user_id = $2 AND date = $3"
        ))
        .bind(task_id)
        .bind(user_id)
        .bind(date)
        .fetch_optional(pool)
        .await
    }

    /// The completion percentage for one task on one day, defaulting to 0
    pub async fn status_for_date(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<i32, sqlx::Error> {
        let record = Self::find_for_date(pool, task_id, user_id, date).await?;
        Ok(record.map(|r| r.completion_percentage).unwrap_or(0))
    }

    /// All completion records for one owner, newest day first
    ///
    /// Used by the task list to attach each task's full history in one
    /// query instead of one query per task.
    pub async fn list_by_owner(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskCompletion>(&format!(
            "SELECT {COMPLETION_COLUMNS} FROM task_completions
             WHERE user_id = $1 ORDER BY date DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// The owner's completion history joined with task names, newest first
    pub async fn history_for_owner(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<CompletionHistoryEntry>, sqlx::Error> {
        sqlx::query_as::<_, CompletionHistoryEntry>(
            "SELECT c.id, c.task_id, t.name AS task_name, c.date,
                    c.completion_percentage, c.completed_at
             FROM task_completions c
             JOIN tasks t ON t.id = c.task_id
             WHERE c.user_id = $1
             ORDER BY c.date DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_serialization_shape() {
        let record = TaskCompletion {
            id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            completion_percentage: 75,
            completed_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["completion_percentage"], 75);
        assert_eq!(json["date"], "2024-03-01");
    }
}
