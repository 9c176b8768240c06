use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Store-assigned task identifier (BIGSERIAL, monotonically increasing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Classification label of a task. Valid range is `0..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct TaskType(i32);

impl TaskType {
    pub const MIN: i32 = 0;
    pub const MAX: i32 = 9;
    /// Number of distinct task types the producer draws from.
    pub const COUNT: i32 = Self::MAX - Self::MIN + 1;

    pub fn new(raw: i32) -> Result<Self, AppError> {
        if (Self::MIN..=Self::MAX).contains(&raw) {
            Ok(Self(raw))
        } else {
            Err(AppError::InvalidInput(format!(
                "Invalid task type: {} (expected {}..={})",
                raw,
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }

    /// Label value used for per-type metrics.
    pub fn label(&self) -> String {
        self.0.to_string()
    }
}

impl TryFrom<i32> for TaskType {
    type Error = AppError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<TaskType> for i32 {
    fn from(task_type: TaskType) -> Self {
        task_type.0
    }
}

impl FromStr for TaskType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .parse::<i32>()
            .map_err(|e| AppError::InvalidInput(format!("Invalid task type '{}': {}", s, e)))?;
        Self::new(raw)
    }
}

impl Display for TaskType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Task payload value. Valid range is `0..=99`; drives simulated work in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct TaskValue(i32);

impl TaskValue {
    pub const MIN: i32 = 0;
    pub const MAX: i32 = 99;

    pub fn new(raw: i32) -> Result<Self, AppError> {
        if (Self::MIN..=Self::MAX).contains(&raw) {
            Ok(Self(raw))
        } else {
            Err(AppError::InvalidInput(format!(
                "Invalid task value: {} (expected {}..={})",
                raw,
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }

    /// Simulated processing time for this value.
    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0 as u64)
    }
}

impl TryFrom<i32> for TaskValue {
    type Error = AppError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<TaskValue> for i32 {
    fn from(value: TaskValue) -> Self {
        value.0
    }
}

impl FromStr for TaskValue {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .parse::<i32>()
            .map_err(|e| AppError::InvalidInput(format!("Invalid task value '{}': {}", s, e)))?;
        Self::new(raw)
    }
}

impl Display for TaskValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state. Transitions are one-directional: received -> processing -> done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Received,
    Processing,
    Done,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Received => "received",
            TaskState::Processing => "processing",
            TaskState::Done => "done",
        }
    }

    /// The only state a task may enter `self` from. `Received` is entered on insert only.
    pub fn predecessor(&self) -> Option<TaskState> {
        match self {
            TaskState::Received => None,
            TaskState::Processing => Some(TaskState::Received),
            TaskState::Done => Some(TaskState::Processing),
        }
    }
}

impl Display for TaskState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(TaskState::Received),
            "processing" => Ok(TaskState::Processing),
            "done" => Ok(TaskState::Done),
            _ => Err(AppError::InvalidInput(format!("Invalid task state: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub task_type: TaskType,
    pub value: TaskValue,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for Task {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Task {
            id: TaskId(row.try_get("id")?),
            task_type: TaskType::new(row.try_get("type")?).map_err(|e| {
                sqlx::Error::Decode(format!("Failed to decode task type: {}", e).into())
            })?,
            value: TaskValue::new(row.try_get("value")?).map_err(|e| {
                sqlx::Error::Decode(format!("Failed to decode task value: {}", e).into())
            })?,
            state: row.try_get::<String, _>("state")?.parse().map_err(|e| {
                sqlx::Error::Decode(format!("Failed to decode task state: {}", e).into())
            })?,
            created_at: row.try_get("creation_time")?,
            updated_at: row.try_get("last_update_time")?,
        })
    }
}

/// Aggregate over completed tasks of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeTotals {
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub done_count: i64,
    pub value_total: i64,
}
