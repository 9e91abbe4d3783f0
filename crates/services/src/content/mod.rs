//! Content providers produce the theory and tasks of a reminder session.

mod generative;
mod payload;

use std::collections::HashMap;

use async_trait::async_trait;
use study_core::model::{Lesson, Reminder, Subject};

use crate::error::ContentError;

pub use generative::{ContentConfig, GenerativeContentProvider};
pub use payload::{build_prompt, parse_reminders};

/// Source of per-subject study content.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Produce one reminder per requested subject.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the content cannot be fetched or parsed.
    async fn fetch(
        &self,
        subjects: &[Subject],
        lessons: &[Lesson],
    ) -> Result<HashMap<Subject, Reminder>, ContentError>;
}
