use study_core::model::Subject;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn coins_from_i64(v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("negative coin balance: {v}")))
}

pub(crate) fn subject_from_str(raw: String) -> Result<Subject, StorageError> {
    Subject::new(raw).map_err(ser)
}
