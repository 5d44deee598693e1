use crate::ids::TaskId;
use crate::task_validation::TaskValidationError;
use polars::prelude::PolarsError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the schedule model, scheduler, codec and stores.
///
/// `Validation` and `CycleOrOrdering` are integrity failures of the core and
/// must reach the caller. `Format` and `NotFound` describe persisted
/// documents. The remaining variants wrap infrastructure failures.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("dependency cycle or unresolvable ordering involving task {task_id}")]
    CycleOrOrdering { task_id: TaskId },
    #[error("format error: {0}")]
    Format(String),
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataframe conversion error: {0}")]
    DataFrame(#[from] PolarsError),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl ScheduleError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<TaskValidationError> for ScheduleError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
