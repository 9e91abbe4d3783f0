//! Coin amounts granted by the reminder flow.

/// Coins for answering a task correctly.
pub const CORRECT_ANSWER_COINS: u32 = 10;

/// Coins for answering a task, even incorrectly.
pub const INCORRECT_ANSWER_COINS: u32 = 5;

/// One-time bonus for answering every task of a subject correctly.
pub const PERFECT_SCORE_BONUS: u32 = 20;

/// The perfect-score bonus only applies to subjects with exactly this many tasks.
pub const PERFECT_SCORE_TASK_COUNT: usize = 3;

/// Once-per-day bonus for finishing all subjects.
pub const COMPLETION_BONUS: u32 = 100;

/// Coins for a submitted answer.
#[must_use]
pub fn answer_reward(correct: bool) -> u32 {
    if correct {
        CORRECT_ANSWER_COINS
    } else {
        INCORRECT_ANSWER_COINS
    }
}
