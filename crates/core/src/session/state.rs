use std::collections::{HashMap, HashSet};

use crate::model::{Reminder, Subject, Task};

//
// ─── PAGES & STATUS ───────────────────────────────────────────────────────────
//

/// The page currently shown by the reminder flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Page {
    #[default]
    Theory1,
    Theory2,
    Task,
    Explanation,
    Completion,
}

impl Page {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Page::Theory1 => "theory1",
            Page::Theory2 => "theory2",
            Page::Task => "task",
            Page::Explanation => "explanation",
            Page::Completion => "completion",
        }
    }
}

/// Lifecycle of a session, independent of the page being shown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No session has been started yet.
    #[default]
    Idle,
    /// Waiting for the content provider.
    Loading,
    Active,
    /// Content could not be produced; the user has to leave and start over.
    Failed { message: String },
    Closed,
}

//
// ─── SCORING ──────────────────────────────────────────────────────────────────
//

/// Correct/total answer counters for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubjectScore {
    pub correct: u32,
    pub total: u32,
}

/// Identifies one question for at-most-once coin awards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuestionKey {
    pub subject: Subject,
    pub task_index: usize,
    pub question: String,
}

/// Position within the session, for progress indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// 1-based subject position.
    pub subject_position: usize,
    pub subject_count: usize,
    /// 1-based task position, 0 while on theory pages.
    pub task_position: usize,
    pub task_count: usize,
}

//
// ─── SESSION STATE ────────────────────────────────────────────────────────────
//

/// Owned state of one reminder session.
///
/// The state only changes through [`crate::session::reduce`]; everything
/// here is readable so a front-end can render it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub(crate) status: SessionStatus,
    pub(crate) subjects: Vec<Subject>,
    pub(crate) reminders: Vec<Reminder>,
    pub(crate) subject_index: usize,
    pub(crate) task_index: usize,
    pub(crate) page: Page,
    pub(crate) selected: Option<usize>,
    pub(crate) coins_earned: u32,
    pub(crate) correct_total: u32,
    pub(crate) answered_total: u32,
    pub(crate) subject_scores: HashMap<Subject, SubjectScore>,
    pub(crate) selections: HashMap<QuestionKey, usize>,
    pub(crate) awarded_questions: HashSet<QuestionKey>,
    pub(crate) awarded_bonuses: HashSet<Subject>,
    pub(crate) finished_subjects: HashSet<Subject>,
    pub(crate) completion_checked: bool,
    pub(crate) can_claim_completion_bonus: bool,
    pub(crate) claim_in_flight: bool,
    pub(crate) completion_bonus_claimed: bool,
    pub(crate) ledger_balance: Option<u64>,
}

impl SessionState {
    #[must_use]
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.status, SessionStatus::Active)
    }

    /// User-facing error message when content could not be loaded.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            SessionStatus::Failed { message } => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    #[must_use]
    pub fn page(&self) -> Page {
        self.page
    }

    #[must_use]
    pub fn subject_index(&self) -> usize {
        self.subject_index
    }

    #[must_use]
    pub fn task_index(&self) -> usize {
        self.task_index
    }

    #[must_use]
    pub fn selected_answer(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn current_subject(&self) -> Option<&Subject> {
        self.subjects.get(self.subject_index)
    }

    #[must_use]
    pub fn current_reminder(&self) -> Option<&Reminder> {
        self.reminders.get(self.subject_index)
    }

    #[must_use]
    pub fn current_task(&self) -> Option<&Task> {
        self.current_reminder()
            .and_then(|reminder| reminder.task(self.task_index))
    }

    /// Whether the selected answer on the current task is correct.
    #[must_use]
    pub fn selected_is_correct(&self) -> Option<bool> {
        let task = self.current_task()?;
        self.selected.map(|option| task.is_correct(option))
    }

    /// Coins granted during this session, counted optimistically.
    #[must_use]
    pub fn coins_earned(&self) -> u32 {
        self.coins_earned
    }

    #[must_use]
    pub fn correct_total(&self) -> u32 {
        self.correct_total
    }

    #[must_use]
    pub fn answered_total(&self) -> u32 {
        self.answered_total
    }

    #[must_use]
    pub fn subject_score(&self, subject: &Subject) -> SubjectScore {
        self.subject_scores.get(subject).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn can_claim_completion_bonus(&self) -> bool {
        self.can_claim_completion_bonus && !self.claim_in_flight
    }

    #[must_use]
    pub fn completion_bonus_claimed(&self) -> bool {
        self.completion_bonus_claimed
    }

    /// Last coin balance confirmed by the reward ledger, if any.
    #[must_use]
    pub fn ledger_balance(&self) -> Option<u64> {
        self.ledger_balance
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.is_active() && self.page == Page::Completion
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let task_count = self.current_reminder().map_or(0, Reminder::task_count);
        let task_position = match self.page {
            Page::Task | Page::Explanation => self.task_index + 1,
            Page::Theory1 | Page::Theory2 | Page::Completion => 0,
        };
        SessionProgress {
            subject_position: (self.subject_index + 1).min(self.subjects.len()),
            subject_count: self.subjects.len(),
            task_position,
            task_count,
        }
    }

    pub(crate) fn question_key(&self, subject_index: usize, task_index: usize) -> Option<QuestionKey> {
        let subject = self.subjects.get(subject_index)?;
        let task = self.reminders.get(subject_index)?.task(task_index)?;
        Some(QuestionKey {
            subject: subject.clone(),
            task_index,
            question: task.question().to_string(),
        })
    }
}
