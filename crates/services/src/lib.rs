#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod content;
pub mod error;
pub mod reminder;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use config::ReminderSettings;
pub use content::{ContentConfig, ContentProvider, GenerativeContentProvider};
pub use error::{AppServicesError, ContentError, LedgerError, ReminderServiceError};
pub use reminder::{ReminderService, ReminderSession};
