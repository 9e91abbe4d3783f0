use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::config::ReminderSettings;
use crate::content::{ContentProvider, GenerativeContentProvider};
use crate::error::AppServicesError;
use crate::reminder::ReminderService;

/// Assembles app-facing services.
#[derive(Clone)]
pub struct AppServices {
    reminders: Arc<ReminderService>,
    content_enabled: bool,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the environment's AI settings.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let provider = GenerativeContentProvider::from_env();
        let content_enabled = provider.enabled();
        if !content_enabled {
            tracing::warn!("STUDY_AI_API_KEY is not set; reminder content cannot be generated");
        }
        let content: Arc<dyn ContentProvider> = Arc::new(provider);
        Ok(Self::from_parts(storage, clock, content, content_enabled))
    }

    /// Build services from already constructed parts.
    #[must_use]
    pub fn from_parts(
        storage: Storage,
        clock: Clock,
        content: Arc<dyn ContentProvider>,
        content_enabled: bool,
    ) -> Self {
        let reminders = Arc::new(
            ReminderService::new(
                clock,
                content,
                Arc::clone(&storage.rewards),
                Arc::clone(&storage.lessons),
            )
            .with_settings(ReminderSettings::from_env()),
        );
        Self {
            reminders,
            content_enabled,
        }
    }

    #[must_use]
    pub fn reminders(&self) -> Arc<ReminderService> {
        Arc::clone(&self.reminders)
    }

    #[must_use]
    pub fn content_enabled(&self) -> bool {
        self.content_enabled
    }
}
