use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as Days;
use services::{
    Clock, ContentError, ContentProvider, ReminderService, ReminderSession, ReminderSettings,
};
use storage::repository::{
    ClaimOutcome, InMemoryRepository, LessonRepository, RewardLedger, StorageError,
};
use study_core::model::{Difficulty, Lesson, Reminder, Subject, Task, Theory, UserId};
use study_core::session::{Page, SessionStatus};
use study_core::time::{fixed_clock, fixed_now, fixed_today};

//
// ─── FAKES ─────────────────────────────────────────────────────────────────────
//

struct ScriptedContent {
    reminders: HashMap<Subject, Reminder>,
    delay: Option<Duration>,
    fail: bool,
    calls: AtomicUsize,
}

impl ScriptedContent {
    fn new(content: &[(&str, &[usize])]) -> Self {
        let reminders = content
            .iter()
            .map(|(name, answers)| (subject(name), reminder(answers)))
            .collect();
        Self {
            reminders,
            delay: None,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(&[("Math", &[0])])
        }
    }
}

#[async_trait]
impl ContentProvider for ScriptedContent {
    async fn fetch(
        &self,
        _subjects: &[Subject],
        _lessons: &[Lesson],
    ) -> Result<HashMap<Subject, Reminder>, ContentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ContentError::EmptyResponse);
        }
        Ok(self.reminders.clone())
    }
}

/// Delegates to an in-memory ledger, counting and optionally failing writes.
#[derive(Default)]
struct CountingLedger {
    inner: InMemoryRepository,
    add_coins_calls: AtomicUsize,
    fail_writes: bool,
}

impl CountingLedger {
    fn new() -> Self {
        Self {
            inner: InMemoryRepository::new().with_clock(fixed_clock()),
            ..Self::default()
        }
    }

    fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::new()
        }
    }

    fn add_coins_calls(&self) -> usize {
        self.add_coins_calls.load(Ordering::SeqCst)
    }

    fn check_writes(&self) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Connection("ledger offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RewardLedger for CountingLedger {
    async fn add_coins(&self, user: &UserId, delta: u32) -> Result<u64, StorageError> {
        self.add_coins_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writes()?;
        self.inner.add_coins(user, delta).await
    }

    async fn coin_balance(&self, user: &UserId) -> Result<u64, StorageError> {
        self.inner.coin_balance(user).await
    }

    async fn mark_subject_completed(
        &self,
        user: &UserId,
        subject: &Subject,
    ) -> Result<(), StorageError> {
        self.check_writes()?;
        self.inner.mark_subject_completed(user, subject).await
    }

    async fn are_all_daily_tasks_completed(
        &self,
        user: &UserId,
        expected_count: usize,
    ) -> Result<bool, StorageError> {
        self.inner
            .are_all_daily_tasks_completed(user, expected_count)
            .await
    }

    async fn has_claimed_completion_bonus(&self, user: &UserId) -> Result<bool, StorageError> {
        self.inner.has_claimed_completion_bonus(user).await
    }

    async fn claim_completion_bonus(&self, user: &UserId) -> Result<ClaimOutcome, StorageError> {
        self.check_writes()?;
        self.inner.claim_completion_bonus(user).await
    }
}

//
// ─── HELPERS ───────────────────────────────────────────────────────────────────
//

fn subject(name: &str) -> Subject {
    Subject::new(name).unwrap()
}

fn user() -> UserId {
    UserId::new("student").unwrap()
}

fn lesson(name: &str) -> Lesson {
    Lesson::new(subject(name), "Topic", "Homework", fixed_today())
}

fn reminder(correct_answers: &[usize]) -> Reminder {
    let tasks = correct_answers
        .iter()
        .enumerate()
        .map(|(idx, correct)| {
            Task::new(
                format!("{idx}: which option?"),
                vec!["a".into(), "b".into(), "c".into()],
                *correct,
                Difficulty::Medium,
                "Explained.",
            )
            .unwrap()
        })
        .collect();
    Reminder::new(
        Theory {
            content: "Theory".into(),
            key_points: Vec::new(),
        },
        tasks,
    )
}

fn service(content: Arc<dyn ContentProvider>, ledger: Arc<dyn RewardLedger>) -> ReminderService {
    ReminderService::new(
        Clock::fixed(fixed_now()),
        content,
        ledger,
        Arc::new(InMemoryRepository::new()),
    )
}

fn clock_days_later(days: i64) -> Clock {
    let mut clock = fixed_clock();
    clock.advance(Days::days(days));
    clock
}

/// Answer every task with the correct option and advance to completion.
async fn play_perfectly(session: &mut ReminderSession) {
    while session.state().page() != Page::Completion {
        if session.state().page() == Page::Task {
            let correct = session.state().current_task().unwrap().correct_answer();
            session.submit_answer(correct).await;
        } else {
            session.advance().await;
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn perfect_session_earns_coins_and_one_completion_bonus() {
    let ledger = Arc::new(CountingLedger::new());
    let service = service(
        Arc::new(ScriptedContent::new(&[("Math", &[1, 2, 0])])),
        ledger.clone(),
    );

    let mut session = service.open(user());
    session.start(Vec::new(), vec![lesson("Math")]).await;
    assert!(session.state().is_active());

    play_perfectly(&mut session).await;
    assert_eq!(session.state().coins_earned(), 50);
    assert_eq!(session.state().correct_total(), 3);
    assert_eq!(ledger.add_coins_calls(), 4);
    assert_eq!(session.state().ledger_balance(), Some(50));
    assert!(session.state().can_claim_completion_bonus());

    assert!(session.claim_bonus().await);
    assert_eq!(session.state().coins_earned(), 150);
    assert_eq!(service.coin_balance(&user()).await.unwrap(), 150);

    assert!(!session.claim_bonus().await);
    assert_eq!(service.coin_balance(&user()).await.unwrap(), 150);

    // A second run on the same day cannot claim again.
    let mut again = service.open(user());
    again.start(Vec::new(), vec![lesson("Math")]).await;
    play_perfectly(&mut again).await;
    assert!(!again.state().can_claim_completion_bonus());
    assert!(!again.claim_bonus().await);
    assert_eq!(service.coin_balance(&user()).await.unwrap(), 200);
}

#[tokio::test]
async fn repeated_submissions_award_each_question_once() {
    let ledger = Arc::new(CountingLedger::new());
    let service = service(
        Arc::new(ScriptedContent::new(&[("Math", &[1, 1])])),
        ledger.clone(),
    );
    let mut session = service.open(user());
    session.start(Vec::new(), vec![lesson("Math")]).await;
    session.advance().await;
    session.advance().await;

    session.submit_answer(1).await;
    session.submit_answer(1).await;
    session.submit_answer(0).await;
    assert_eq!(ledger.add_coins_calls(), 1);
    assert_eq!(session.state().coins_earned(), 10);

    // Going back to the task and answering again still does not pay out.
    session.retreat().await;
    session.submit_answer(0).await;
    assert_eq!(session.state().page(), Page::Explanation);
    assert_eq!(ledger.add_coins_calls(), 1);
    assert_eq!(service.coin_balance(&user()).await.unwrap(), 10);
}

#[tokio::test]
async fn fetch_failure_is_reported_without_retry() {
    let content = Arc::new(ScriptedContent::failing());
    let service = service(content.clone(), Arc::new(CountingLedger::new()));
    let mut session = service.open(user());
    session.start(Vec::new(), vec![lesson("Math")]).await;

    assert!(session.state().error_message().is_some());
    session.advance().await;
    assert_eq!(content.calls.load(Ordering::SeqCst), 1);
    assert!(matches!(session.state().status(), SessionStatus::Failed { .. }));
}

#[tokio::test]
async fn slow_content_times_out() {
    let service = service(
        Arc::new(ScriptedContent::slow(Duration::from_millis(500))),
        Arc::new(CountingLedger::new()),
    )
    .with_settings(ReminderSettings {
        fetch_timeout: Duration::from_millis(20),
        ledger_timeout: Duration::from_secs(1),
    });
    let mut session = service.open(user());
    session.start(Vec::new(), vec![lesson("Math")]).await;
    assert!(session.state().error_message().is_some());
}

#[tokio::test]
async fn ledger_failures_keep_optimistic_coins() {
    let ledger = Arc::new(CountingLedger::failing_writes());
    let service = service(
        Arc::new(ScriptedContent::new(&[("Math", &[0, 0, 0])])),
        ledger.clone(),
    );
    let mut session = service.open(user());
    session.start(Vec::new(), vec![lesson("Math")]).await;
    play_perfectly(&mut session).await;

    assert_eq!(session.state().coins_earned(), 50);
    assert_eq!(session.state().ledger_balance(), None);
    assert_eq!(ledger.add_coins_calls(), 4);
    // The subject was never recorded as complete, so no bonus is offered.
    assert!(!session.state().can_claim_completion_bonus());
}

#[tokio::test]
async fn start_for_today_uses_stored_lessons() {
    let repo = InMemoryRepository::new().with_clock(fixed_clock());
    for name in ["Biology", "History", "Biology"] {
        repo.insert_lesson(&user(), &lesson(name)).await.unwrap();
    }
    let yesterday = fixed_today().pred_opt().unwrap();
    repo.insert_lesson(&user(), &Lesson::new(subject("Art"), "Old", "", yesterday))
        .await
        .unwrap();

    let content = Arc::new(ScriptedContent::new(&[
        ("Biology", &[0]),
        ("History", &[0]),
        ("Art", &[0]),
    ]));
    let service = ReminderService::new(
        Clock::fixed(fixed_now()),
        content,
        Arc::new(repo.clone()),
        Arc::new(repo),
    );

    let session = service.start_for_today(user(), Vec::new()).await.unwrap();
    assert_eq!(session.state().subjects(), &[subject("Biology"), subject("History")]);
    assert_eq!(session.state().page(), Page::Theory1);

    let session = service
        .start_for_today(user(), vec![subject("Art"), subject("History")])
        .await
        .unwrap();
    assert_eq!(session.state().subjects(), &[subject("History")]);
}

#[tokio::test]
async fn multi_subject_bonus_needs_every_subject() {
    let ledger = Arc::new(CountingLedger::new());
    let service = service(
        Arc::new(ScriptedContent::new(&[("Math", &[0, 0, 0]), ("Art", &[1])])),
        ledger.clone(),
    );
    let mut session = service.open(user());
    session
        .start(Vec::new(), vec![lesson("Math"), lesson("Art")])
        .await;
    play_perfectly(&mut session).await;

    // 3 x 10 + 20 perfect bonus for Math, 10 for Art (one task, no bonus).
    assert_eq!(session.state().coins_earned(), 60);
    assert!(session.state().can_claim_completion_bonus());

    session.close().await;
    assert_eq!(session.state().status(), &SessionStatus::Closed);
    assert!(!session.claim_bonus().await);
}

#[tokio::test]
async fn session_clocks_cannot_unlock_extra_daily_bonuses() {
    let ledger = Arc::new(InMemoryRepository::new().with_clock(fixed_clock()));
    let mut granted = 0;

    for days in 0..3 {
        let service = ReminderService::new(
            clock_days_later(days),
            Arc::new(ScriptedContent::new(&[("Math", &[0, 0, 0])])),
            ledger.clone(),
            Arc::new(InMemoryRepository::new()),
        );
        let mut session = service.open(user());
        session.start(Vec::new(), vec![lesson("Math")]).await;
        play_perfectly(&mut session).await;
        if session.claim_bonus().await {
            granted += 1;
        }
    }

    assert_eq!(granted, 1);
    assert_eq!(ledger.coin_balance(&user()).await.unwrap(), 3 * 50 + 100);
}

#[tokio::test]
async fn completion_bonus_returns_when_the_ledger_day_rolls_over() {
    let today = InMemoryRepository::new().with_clock(fixed_clock());
    let tomorrow = today.clone().with_clock(clock_days_later(1));

    for ledger in [today, tomorrow] {
        let service = service(
            Arc::new(ScriptedContent::new(&[("Math", &[2])])),
            Arc::new(ledger),
        );
        let mut session = service.open(user());
        session.start(Vec::new(), vec![lesson("Math")]).await;
        play_perfectly(&mut session).await;
        assert!(session.state().can_claim_completion_bonus());
        assert!(session.claim_bonus().await);
    }
}
