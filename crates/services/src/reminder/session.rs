use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use storage::repository::{RewardLedger, StorageError};
use study_core::model::{Lesson, Subject, UserId};
use study_core::session::{
    AwardReason, ClaimResult, Command, SessionEvent, SessionState, reduce,
};

use crate::config::ReminderSettings;
use crate::content::ContentProvider;
use crate::error::{ContentError, LedgerError};

const FETCH_FAILED_MESSAGE: &str =
    "We couldn't prepare today's reminder. Leave this screen and try again later.";

/// A running reminder session for one user.
///
/// Each entry point feeds one event into the state machine, executes the
/// commands it returns against the content provider and reward ledger, and
/// feeds their results back until the session settles. Taking `&mut self`
/// keeps events strictly ordered.
pub struct ReminderSession {
    user: UserId,
    settings: ReminderSettings,
    content: Arc<dyn ContentProvider>,
    ledger: Arc<dyn RewardLedger>,
    state: SessionState,
}

impl ReminderSession {
    #[must_use]
    pub fn new(
        user: UserId,
        settings: ReminderSettings,
        content: Arc<dyn ContentProvider>,
        ledger: Arc<dyn RewardLedger>,
    ) -> Self {
        Self {
            user,
            settings,
            content,
            ledger,
            state: SessionState::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Reset everything and load content for the resolved subjects.
    pub async fn start(&mut self, selected: Vec<Subject>, lessons: Vec<Lesson>) {
        tracing::info!(
            user = %self.user,
            selected = selected.len(),
            lessons = lessons.len(),
            "starting reminder session"
        );
        self.dispatch(SessionEvent::Start { selected, lessons }).await;
    }

    pub async fn submit_answer(&mut self, option: usize) {
        self.dispatch(SessionEvent::SubmitAnswer(option)).await;
    }

    pub async fn advance(&mut self) {
        self.dispatch(SessionEvent::Advance).await;
    }

    pub async fn retreat(&mut self) {
        self.dispatch(SessionEvent::Retreat).await;
    }

    /// Claim today's completion bonus.
    ///
    /// Returns `true` only when this call granted the bonus.
    pub async fn claim_bonus(&mut self) -> bool {
        let already_claimed = self.state.completion_bonus_claimed();
        self.dispatch(SessionEvent::ClaimBonus).await;
        !already_claimed && self.state.completion_bonus_claimed()
    }

    pub async fn close(&mut self) {
        tracing::info!(
            user = %self.user,
            coins = self.state.coins_earned(),
            correct = self.state.correct_total(),
            answered = self.state.answered_total(),
            "closing reminder session"
        );
        self.dispatch(SessionEvent::Close).await;
    }

    async fn dispatch(&mut self, event: SessionEvent) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            let kind = event.kind();
            let (state, commands) = reduce(std::mem::take(&mut self.state), event);
            self.state = state;
            if commands.is_empty() {
                tracing::debug!(
                    user = %self.user,
                    event = kind,
                    page = self.state.page().as_str(),
                    "session event applied without side effects"
                );
            }
            for command in commands {
                if let Some(result) = self.execute(command).await {
                    pending.push_back(result);
                }
            }
        }
    }

    async fn execute(&self, command: Command) -> Option<SessionEvent> {
        tracing::debug!(user = %self.user, ?command, "executing session command");
        match command {
            Command::FetchContent { subjects, lessons } => {
                let fetch = self.content.fetch(&subjects, &lessons);
                let result = match tokio::time::timeout(self.settings.fetch_timeout, fetch).await {
                    Ok(result) => result,
                    Err(_) => Err(ContentError::Timeout(self.settings.fetch_timeout)),
                };
                Some(SessionEvent::ContentLoaded(result.map_err(|err| {
                    tracing::error!(user = %self.user, error = %err, "content fetch failed");
                    FETCH_FAILED_MESSAGE.to_string()
                })))
            }
            Command::AwardCoins { reason, amount } => {
                match self.ledger_call(self.ledger.add_coins(&self.user, amount)).await {
                    Ok(new_total) => Some(SessionEvent::CoinsAwarded { reason, new_total }),
                    Err(err) => {
                        tracing::warn!(
                            user = %self.user,
                            reason = %DisplayReason(&reason),
                            amount,
                            error = %err,
                            "coin award failed"
                        );
                        None
                    }
                }
            }
            Command::MarkSubjectCompleted { subject } => {
                let call = self.ledger.mark_subject_completed(&self.user, &subject);
                if let Err(err) = self.ledger_call(call).await {
                    tracing::warn!(
                        user = %self.user,
                        %subject,
                        error = %err,
                        "marking subject completed failed"
                    );
                }
                None
            }
            Command::CheckCompletionBonus { expected_subjects } => {
                let eligible = match self.completion_bonus_eligible(expected_subjects).await {
                    Ok(eligible) => eligible,
                    Err(err) => {
                        tracing::warn!(user = %self.user, error = %err, "completion check failed");
                        false
                    }
                };
                Some(SessionEvent::CompletionBonusChecked { eligible })
            }
            Command::ClaimCompletionBonus => {
                let call = self.ledger.claim_completion_bonus(&self.user);
                let result = match self.ledger_call(call).await {
                    Ok(outcome) if outcome.success => ClaimResult::Granted {
                        new_total: outcome.new_total,
                    },
                    Ok(_) => {
                        tracing::info!(user = %self.user, "completion bonus already claimed today");
                        ClaimResult::Rejected
                    }
                    Err(err) => {
                        tracing::warn!(user = %self.user, error = %err, "completion bonus claim failed");
                        ClaimResult::Failed
                    }
                };
                Some(SessionEvent::BonusClaimed(result))
            }
        }
    }

    async fn completion_bonus_eligible(&self, expected_subjects: usize) -> Result<bool, LedgerError> {
        let all_done = self
            .ledger_call(
                self.ledger
                    .are_all_daily_tasks_completed(&self.user, expected_subjects),
            )
            .await?;
        if !all_done {
            return Ok(false);
        }
        let claimed = self
            .ledger_call(self.ledger.has_claimed_completion_bonus(&self.user))
            .await?;
        Ok(!claimed)
    }

    async fn ledger_call<T>(
        &self,
        call: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, LedgerError> {
        with_timeout(self.settings.ledger_timeout, call).await
    }
}

async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, StorageError>>,
) -> Result<T, LedgerError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(LedgerError::Timeout(limit)),
    }
}

struct DisplayReason<'a>(&'a AwardReason);

impl fmt::Display for DisplayReason<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            AwardReason::Answer(key) => {
                write!(f, "answer {}#{}", key.subject, key.task_index)
            }
            AwardReason::PerfectScore(subject) => write!(f, "perfect score in {subject}"),
        }
    }
}

impl fmt::Debug for ReminderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReminderSession")
            .field("user", &self.user)
            .field("status", self.state.status())
            .field("page", &self.state.page())
            .field("coins_earned", &self.state.coins_earned())
            .finish_non_exhaustive()
    }
}
