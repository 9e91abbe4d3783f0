use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::Subject;

/// One entry from the student's lesson diary.
///
/// Lessons decide which subjects a reminder session covers and are passed
/// to the content provider as context for generating theory and tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub subject: Subject,
    pub topic: String,
    pub homework: String,
    pub date: NaiveDate,
}

impl Lesson {
    #[must_use]
    pub fn new(
        subject: Subject,
        topic: impl Into<String>,
        homework: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            subject,
            topic: topic.into(),
            homework: homework.into(),
            date,
        }
    }
}
