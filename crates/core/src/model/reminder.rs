use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Reasons a generated task is unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaskError {
    #[error("task question cannot be empty")]
    EmptyQuestion,

    #[error("task has no answer options")]
    NoOptions,

    #[error("correct answer index {index} is out of range for {len} options")]
    CorrectAnswerOutOfRange { index: usize, len: usize },
}

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "Easy")]
    Easy,
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "Hard")]
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

//
// ─── TASK ─────────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question inside a reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    difficulty: Difficulty,
    explanation: String,
}

impl Task {
    /// Build a validated task.
    ///
    /// # Errors
    ///
    /// Returns `TaskError` if the question is blank, there are no options, or
    /// `correct_answer` does not point at one of the options.
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        difficulty: Difficulty,
        explanation: impl Into<String>,
    ) -> Result<Self, TaskError> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(TaskError::EmptyQuestion);
        }
        if options.is_empty() {
            return Err(TaskError::NoOptions);
        }
        if correct_answer >= options.len() {
            return Err(TaskError::CorrectAnswerOutOfRange {
                index: correct_answer,
                len: options.len(),
            });
        }

        Ok(Self {
            question,
            options,
            correct_answer,
            difficulty,
            explanation: explanation.into(),
        })
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_answer
    }
}

//
// ─── REMINDER ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Theory {
    pub content: String,
    pub key_points: Vec<String>,
}

/// Generated study content for one subject: theory pages followed by tasks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reminder {
    theory: Theory,
    tasks: Vec<Task>,
}

impl Reminder {
    #[must_use]
    pub fn new(theory: Theory, tasks: Vec<Task>) -> Self {
        Self { theory, tasks }
    }

    #[must_use]
    pub fn theory(&self) -> &Theory {
        &self.theory
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn task(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn task_rejects_out_of_range_answer() {
        let err = Task::new("Q?", options(), 3, Difficulty::Easy, "").unwrap_err();
        assert_eq!(err, TaskError::CorrectAnswerOutOfRange { index: 3, len: 3 });
    }

    #[test]
    fn task_rejects_missing_options_and_question() {
        assert_eq!(
            Task::new("Q?", Vec::new(), 0, Difficulty::Hard, "").unwrap_err(),
            TaskError::NoOptions
        );
        assert_eq!(
            Task::new(" ", options(), 0, Difficulty::Hard, "").unwrap_err(),
            TaskError::EmptyQuestion
        );
    }

    #[test]
    fn task_checks_correctness() {
        let task = Task::new("2+2?", options(), 1, Difficulty::Medium, "four").unwrap();
        assert!(task.is_correct(1));
        assert!(!task.is_correct(0));
    }

    #[test]
    fn difficulty_uses_lowercase_names() {
        let parsed: Difficulty = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, Difficulty::Medium);
        assert_eq!(Difficulty::Hard.as_str(), "hard");
    }
}
