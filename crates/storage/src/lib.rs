#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    ClaimOutcome, InMemoryRepository, LessonRepository, RewardLedger, Storage, StorageError,
};
