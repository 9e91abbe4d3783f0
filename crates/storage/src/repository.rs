use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use study_core::Clock;
use study_core::model::{Lesson, Subject, UserId};
use study_core::rewards::COMPLETION_BONUS;
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Answer to a completion-bonus claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimOutcome {
    /// False when the bonus was already claimed for that day.
    pub success: bool,
    /// Coin balance after the claim (unchanged when `success` is false).
    pub new_total: u64,
}

/// Store of record for coin balances and daily completion flags.
///
/// Implementations serialize writers themselves: `add_coins` is an atomic
/// increment and `claim_completion_bonus` succeeds at most once per user and
/// day no matter how often or how concurrently it is called. The ledger owns
/// its clock; "today" is never taken from the caller.
#[async_trait]
pub trait RewardLedger: Send + Sync {
    /// Atomically add `delta` coins and return the new balance.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the balance cannot be updated.
    async fn add_coins(&self, user: &UserId, delta: u32) -> Result<u64, StorageError>;

    /// Current coin balance (zero for unknown users).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the balance cannot be read.
    async fn coin_balance(&self, user: &UserId) -> Result<u64, StorageError>;

    /// Record that the user finished `subject` today. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the completion cannot be stored.
    async fn mark_subject_completed(
        &self,
        user: &UserId,
        subject: &Subject,
    ) -> Result<(), StorageError>;

    /// Whether at least `expected_count` distinct subjects were completed today.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn are_all_daily_tasks_completed(
        &self,
        user: &UserId,
        expected_count: usize,
    ) -> Result<bool, StorageError>;

    /// Whether today's completion bonus was already claimed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn has_claimed_completion_bonus(&self, user: &UserId) -> Result<bool, StorageError>;

    /// Claim today's completion bonus, crediting the coins in the same step.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the claim cannot be recorded.
    async fn claim_completion_bonus(&self, user: &UserId) -> Result<ClaimOutcome, StorageError>;
}

/// Repository contract for the lesson diary.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Append a lesson for the user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn insert_lesson(&self, user: &UserId, lesson: &Lesson) -> Result<i64, StorageError>;

    /// Lessons dated `day`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_lessons(&self, user: &UserId, day: NaiveDate)
    -> Result<Vec<Lesson>, StorageError>;
}

#[derive(Default)]
struct LedgerBook {
    coins: HashMap<UserId, u64>,
    completions: HashSet<(UserId, NaiveDate, Subject)>,
    claims: HashSet<(UserId, NaiveDate)>,
}

impl LedgerBook {
    fn credit(&mut self, user: &UserId, delta: u64) -> u64 {
        let balance = self.coins.entry(user.clone()).or_insert(0);
        *balance = balance.saturating_add(delta);
        *balance
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Clones share their data; each clone keeps its own clock.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    ledger: Arc<Mutex<LedgerBook>>,
    lessons: Arc<Mutex<Vec<(UserId, Lesson)>>>,
    clock: Clock,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide "today" for daily completions and claims with `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn book(&self) -> Result<std::sync::MutexGuard<'_, LedgerBook>, StorageError> {
        self.ledger
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl RewardLedger for InMemoryRepository {
    async fn add_coins(&self, user: &UserId, delta: u32) -> Result<u64, StorageError> {
        let mut book = self.book()?;
        Ok(book.credit(user, u64::from(delta)))
    }

    async fn coin_balance(&self, user: &UserId) -> Result<u64, StorageError> {
        let book = self.book()?;
        Ok(book.coins.get(user).copied().unwrap_or(0))
    }

    async fn mark_subject_completed(
        &self,
        user: &UserId,
        subject: &Subject,
    ) -> Result<(), StorageError> {
        let day = self.clock.today();
        let mut book = self.book()?;
        book.completions
            .insert((user.clone(), day, subject.clone()));
        Ok(())
    }

    async fn are_all_daily_tasks_completed(
        &self,
        user: &UserId,
        expected_count: usize,
    ) -> Result<bool, StorageError> {
        let day = self.clock.today();
        let book = self.book()?;
        let completed = book
            .completions
            .iter()
            .filter(|(owner, completed_on, _)| owner == user && *completed_on == day)
            .count();
        Ok(completed >= expected_count)
    }

    async fn has_claimed_completion_bonus(&self, user: &UserId) -> Result<bool, StorageError> {
        let day = self.clock.today();
        let book = self.book()?;
        Ok(book.claims.contains(&(user.clone(), day)))
    }

    async fn claim_completion_bonus(&self, user: &UserId) -> Result<ClaimOutcome, StorageError> {
        let day = self.clock.today();
        let mut book = self.book()?;
        if !book.claims.insert((user.clone(), day)) {
            let new_total = book.coins.get(user).copied().unwrap_or(0);
            return Ok(ClaimOutcome {
                success: false,
                new_total,
            });
        }
        let new_total = book.credit(user, u64::from(COMPLETION_BONUS));
        Ok(ClaimOutcome {
            success: true,
            new_total,
        })
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn insert_lesson(&self, user: &UserId, lesson: &Lesson) -> Result<i64, StorageError> {
        let mut guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push((user.clone(), lesson.clone()));
        i64::try_from(guard.len()).map_err(|_| StorageError::Serialization("lesson id overflow".into()))
    }

    async fn list_lessons(
        &self,
        user: &UserId,
        day: NaiveDate,
    ) -> Result<Vec<Lesson>, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|(owner, lesson)| owner == user && lesson.date == day)
            .map(|(_, lesson)| lesson.clone())
            .collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub rewards: Arc<dyn RewardLedger>,
    pub lessons: Arc<dyn LessonRepository>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use study_core::time::{fixed_clock, fixed_today};

    fn user() -> UserId {
        UserId::new("student").unwrap()
    }

    fn subject(name: &str) -> Subject {
        Subject::new(name).unwrap()
    }

    fn repo() -> InMemoryRepository {
        InMemoryRepository::new().with_clock(fixed_clock())
    }

    /// A view of `repo`'s data whose clock is `days` later.
    fn days_later(repo: &InMemoryRepository, days: i64) -> InMemoryRepository {
        let mut clock = fixed_clock();
        clock.advance(Duration::days(days));
        repo.clone().with_clock(clock)
    }

    #[tokio::test]
    async fn coins_accumulate_per_user() {
        let repo = repo();
        let other = UserId::new("other").unwrap();

        assert_eq!(repo.add_coins(&user(), 10).await.unwrap(), 10);
        assert_eq!(repo.add_coins(&user(), 5).await.unwrap(), 15);
        assert_eq!(repo.add_coins(&other, 20).await.unwrap(), 20);
        assert_eq!(repo.coin_balance(&user()).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let repo = repo();
        let mut handles = Vec::new();
        for _ in 0..50 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.add_coins(&user(), 2).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(repo.coin_balance(&user()).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn completions_are_idempotent_and_per_day() {
        let repo = repo();
        let yesterday = days_later(&repo, -1);

        repo.mark_subject_completed(&user(), &subject("Math")).await.unwrap();
        repo.mark_subject_completed(&user(), &subject("Math")).await.unwrap();
        yesterday
            .mark_subject_completed(&user(), &subject("History"))
            .await
            .unwrap();

        assert!(repo.are_all_daily_tasks_completed(&user(), 1).await.unwrap());
        assert!(!repo.are_all_daily_tasks_completed(&user(), 2).await.unwrap());
        assert!(!days_later(&repo, 1)
            .are_all_daily_tasks_completed(&user(), 1)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn completion_bonus_is_claimed_once_per_day() {
        let repo = repo();
        repo.add_coins(&user(), 30).await.unwrap();

        let first = repo.claim_completion_bonus(&user()).await.unwrap();
        assert_eq!(
            first,
            ClaimOutcome {
                success: true,
                new_total: 130
            }
        );
        assert!(repo.has_claimed_completion_bonus(&user()).await.unwrap());

        let second = repo.claim_completion_bonus(&user()).await.unwrap();
        assert_eq!(
            second,
            ClaimOutcome {
                success: false,
                new_total: 130
            }
        );

        let tomorrow = days_later(&repo, 1);
        assert!(!tomorrow.has_claimed_completion_bonus(&user()).await.unwrap());
        assert!(tomorrow.claim_completion_bonus(&user()).await.unwrap().success);
    }

    #[tokio::test]
    async fn lessons_are_listed_by_day() {
        let repo = repo();
        let today = fixed_today();
        let lesson = Lesson::new(subject("Math"), "Fractions", "p. 12", today);
        let old = Lesson::new(subject("Art"), "Colors", "", today.pred_opt().unwrap());
        repo.insert_lesson(&user(), &lesson).await.unwrap();
        repo.insert_lesson(&user(), &old).await.unwrap();

        assert_eq!(repo.list_lessons(&user(), today).await.unwrap(), vec![lesson]);
    }
}
