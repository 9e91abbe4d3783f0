mod ids;
mod lesson;
mod reminder;
mod subject;

pub use ids::{IdError, UserId};
pub use lesson::Lesson;
pub use reminder::{Difficulty, Reminder, Task, TaskError, Theory};
pub use subject::{Subject, SubjectError};
