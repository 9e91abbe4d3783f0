use std::collections::HashMap;

use crate::model::{Lesson, Reminder, Subject};
use crate::session::state::QuestionKey;

/// Everything that can happen to a session: user input and effect results.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Begin a fresh session. An empty selection means "all lesson subjects".
    Start {
        selected: Vec<Subject>,
        lessons: Vec<Lesson>,
    },
    /// Result of [`Command::FetchContent`]; the error is a user-facing message.
    ContentLoaded(Result<HashMap<Subject, Reminder>, String>),
    SubmitAnswer(usize),
    Advance,
    Retreat,
    ClaimBonus,
    /// The ledger confirmed an award from [`Command::AwardCoins`].
    CoinsAwarded { reason: AwardReason, new_total: u64 },
    /// Result of [`Command::CheckCompletionBonus`].
    CompletionBonusChecked { eligible: bool },
    /// Result of [`Command::ClaimCompletionBonus`].
    BonusClaimed(ClaimResult),
    Close,
}

impl SessionEvent {
    /// Short name for logs; payloads can be large.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::Start { .. } => "start",
            SessionEvent::ContentLoaded(_) => "content_loaded",
            SessionEvent::SubmitAnswer(_) => "submit_answer",
            SessionEvent::Advance => "advance",
            SessionEvent::Retreat => "retreat",
            SessionEvent::ClaimBonus => "claim_bonus",
            SessionEvent::CoinsAwarded { .. } => "coins_awarded",
            SessionEvent::CompletionBonusChecked { .. } => "completion_bonus_checked",
            SessionEvent::BonusClaimed(_) => "bonus_claimed",
            SessionEvent::Close => "close",
        }
    }
}

/// Why coins are being granted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AwardReason {
    Answer(QuestionKey),
    PerfectScore(Subject),
}

/// How the ledger answered a completion-bonus claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResult {
    Granted { new_total: u64 },
    /// Already claimed today, or not every subject is complete.
    Rejected,
    /// The ledger could not be reached; the claim may be retried.
    Failed,
}

/// Side effects requested by the reducer, executed by an effect runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchContent {
        subjects: Vec<Subject>,
        lessons: Vec<Lesson>,
    },
    AwardCoins { reason: AwardReason, amount: u32 },
    MarkSubjectCompleted { subject: Subject },
    CheckCompletionBonus { expected_subjects: usize },
    ClaimCompletionBonus,
}
