//! Reminder session state machine.
//!
//! A session walks every subject through `theory1 -> theory2 -> task ->
//! explanation` (task and explanation repeat per task) and ends on
//! `completion`. [`reduce`] is pure: it returns the next state and the
//! [`Command`]s an effect runner has to execute, whose results come back as
//! [`SessionEvent`]s.

mod event;
mod reducer;
mod state;
mod subjects;

pub use event::{AwardReason, ClaimResult, Command, SessionEvent};
pub use reducer::reduce;
pub use state::{Page, QuestionKey, SessionProgress, SessionState, SessionStatus, SubjectScore};
pub use subjects::resolve_subjects;
