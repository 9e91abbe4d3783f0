use thiserror::Error;

use crate::model::{IdError, SubjectError, TaskError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Subject(#[from] SubjectError),
    #[error(transparent)]
    Task(#[from] TaskError),
}
