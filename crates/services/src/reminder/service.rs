use std::sync::Arc;

use storage::repository::{LessonRepository, RewardLedger};
use study_core::Clock;
use study_core::model::{Subject, UserId};

use super::session::ReminderSession;
use crate::config::ReminderSettings;
use crate::content::ContentProvider;
use crate::error::ReminderServiceError;

/// Creates reminder sessions wired to shared collaborators.
///
/// The clock only picks which day's lessons to review; the reward ledger
/// keeps its own notion of "today".
#[derive(Clone)]
pub struct ReminderService {
    clock: Clock,
    settings: ReminderSettings,
    content: Arc<dyn ContentProvider>,
    ledger: Arc<dyn RewardLedger>,
    lessons: Arc<dyn LessonRepository>,
}

impl ReminderService {
    #[must_use]
    pub fn new(
        clock: Clock,
        content: Arc<dyn ContentProvider>,
        ledger: Arc<dyn RewardLedger>,
        lessons: Arc<dyn LessonRepository>,
    ) -> Self {
        Self {
            clock,
            settings: ReminderSettings::default(),
            content,
            ledger,
            lessons,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ReminderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// An idle session for `user`; call [`ReminderSession::start`] to begin.
    #[must_use]
    pub fn open(&self, user: UserId) -> ReminderSession {
        ReminderSession::new(
            user,
            self.settings,
            Arc::clone(&self.content),
            Arc::clone(&self.ledger),
        )
    }

    /// Start a session over today's lessons.
    ///
    /// An empty `selected` list reviews every subject with a lesson today.
    ///
    /// # Errors
    ///
    /// Returns `ReminderServiceError::Storage` if the lessons cannot be loaded.
    pub async fn start_for_today(
        &self,
        user: UserId,
        selected: Vec<Subject>,
    ) -> Result<ReminderSession, ReminderServiceError> {
        let lessons = self.lessons.list_lessons(&user, self.clock.today()).await?;
        let mut session = self.open(user);
        session.start(selected, lessons).await;
        Ok(session)
    }

    /// Current coin balance according to the ledger.
    ///
    /// # Errors
    ///
    /// Returns `ReminderServiceError::Storage` on ledger failures.
    pub async fn coin_balance(&self, user: &UserId) -> Result<u64, ReminderServiceError> {
        Ok(self.ledger.coin_balance(user).await?)
    }
}
