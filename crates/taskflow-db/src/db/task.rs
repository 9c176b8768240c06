use sqlx::{PgPool, Postgres, Row};

use taskflow_core::{AppError, Task, TaskId, TaskState, TaskType, TaskValue, TypeTotals};

use super::store::{required_predecessor, TaskStore};

#[derive(Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl TaskStore for PostgresTaskRepository {
    #[tracing::instrument(skip(self))]
    async fn insert(&self, task_type: TaskType, value: TaskValue) -> Result<TaskId, AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (type, value, state)
            VALUES ($1, $2, 'received')
            RETURNING id
            "#,
        )
        .bind(task_type.as_i32())
        .bind(value.as_i32())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                task_type = %task_type,
                value = %value,
                "Failed to insert task into database"
            );
            AppError::Database(e)
        })?;

        tracing::debug!(task_id = id, task_type = %task_type, value = %value, "Task inserted");

        Ok(TaskId(id))
    }

    #[tracing::instrument(skip(self))]
    async fn count_by_state(&self, state: TaskState) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE state = $1")
            .bind(state.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Atomically claim the oldest matching received task
    ///
    /// The inner SELECT locks the candidate row with `FOR UPDATE SKIP LOCKED`, so a
    /// concurrent claimant skips it and moves on to the next duplicate (or finds none).
    /// The outer `state = 'received'` guard re-checks the row after the lock is taken.
    #[tracing::instrument(skip(self))]
    async fn claim_one(
        &self,
        task_type: TaskType,
        value: TaskValue,
    ) -> Result<Option<TaskId>, AppError> {
        let claimed: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE tasks
            SET state = 'processing',
                last_update_time = NOW()
            WHERE id = (
                SELECT id
                FROM tasks
                WHERE type = $1
                    AND value = $2
                    AND state = 'received'
                ORDER BY id ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
                AND state = 'received'
            RETURNING id
            "#,
        )
        .bind(task_type.as_i32())
        .bind(value.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        match claimed {
            Some(id) => {
                tracing::debug!(task_id = id, task_type = %task_type, value = %value, "Task claimed");
                Ok(Some(TaskId(id)))
            }
            None => {
                tracing::trace!(task_type = %task_type, value = %value, "No received task matches");
                Ok(None)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn transition(&self, id: TaskId, new_state: TaskState) -> Result<u64, AppError> {
        let from_state = required_predecessor(new_state)?;

        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET state = $2,
                last_update_time = NOW()
            WHERE id = $1 AND state = $3
            "#,
        )
        .bind(id.0)
        .bind(new_state.as_str())
        .bind(from_state.as_str())
        .execute(&self.pool)
        .await?;

        let affected = result.rows_affected();
        if affected == 0 {
            tracing::debug!(
                task_id = %id,
                from = %from_state,
                to = %new_state,
                "Transition matched no task"
            );
        }

        Ok(affected)
    }

    #[tracing::instrument(skip(self))]
    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, AppError> {
        let task: Option<Task> = sqlx::query_as::<Postgres, Task>(
            r#"
            SELECT
                id,
                type,
                value,
                state,
                creation_time,
                last_update_time
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    #[tracing::instrument(skip(self))]
    async fn value_totals(&self) -> Result<Vec<TypeTotals>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT
                type,
                COUNT(*) AS done_count,
                COALESCE(SUM(value), 0)::BIGINT AS value_total
            FROM tasks
            WHERE state = 'done'
            GROUP BY type
            ORDER BY type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(TypeTotals {
                    task_type: TaskType::new(row.try_get("type")?)?,
                    done_count: row.try_get("done_count")?,
                    value_total: row.try_get("value_total")?,
                })
            })
            .collect()
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
