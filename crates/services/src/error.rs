//! Shared error types for the services crate.

use std::time::Duration;

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use study_core::model::{SubjectError, TaskError};

/// Errors emitted by content providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("content generation is not configured")]
    Disabled,
    #[error("content request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("content response was empty")]
    EmptyResponse,
    #[error("content response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Subject(#[from] SubjectError),
    #[error("invalid task for {subject}: {source}")]
    InvalidTask {
        subject: String,
        #[source]
        source: TaskError,
    },
    #[error("content request timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors emitted while talking to the reward ledger.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("reward ledger call timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors emitted by `ReminderService` before a session exists.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReminderServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
