mod service;
mod session;

pub use service::ReminderService;
pub use session::ReminderSession;
