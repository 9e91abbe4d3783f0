use std::collections::HashMap;

use crate::model::{Lesson, Reminder, Subject};
use crate::rewards::{
    COMPLETION_BONUS, PERFECT_SCORE_BONUS, PERFECT_SCORE_TASK_COUNT, answer_reward,
};
use crate::session::event::{AwardReason, ClaimResult, Command, SessionEvent};
use crate::session::state::{Page, SessionState, SessionStatus};
use crate::session::subjects::resolve_subjects;

const NO_SUBJECTS_MESSAGE: &str = "There are no lessons to review.";

/// Apply one event to a session and collect the side effects it requests.
///
/// Guards that protect coin awards and bonus claims are updated here, before
/// the matching [`Command`] is handed out, so replaying an event can never
/// produce a second award.
#[must_use]
pub fn reduce(mut state: SessionState, event: SessionEvent) -> (SessionState, Vec<Command>) {
    let mut commands = Vec::new();
    match event {
        SessionEvent::Start { selected, lessons } => {
            state = start(&selected, lessons, &mut commands);
        }
        SessionEvent::Close => state.status = SessionStatus::Closed,
        SessionEvent::ContentLoaded(result) => state.content_loaded(result),
        // Everything below only applies to a running session.
        _ if !state.is_active() => {}
        SessionEvent::SubmitAnswer(option) => state.submit_answer(option, &mut commands),
        SessionEvent::Advance => state.advance(&mut commands),
        SessionEvent::Retreat => state.retreat(),
        SessionEvent::ClaimBonus => state.claim_bonus(&mut commands),
        SessionEvent::CoinsAwarded { new_total, .. } => state.ledger_balance = Some(new_total),
        SessionEvent::CompletionBonusChecked { eligible } => {
            state.can_claim_completion_bonus = eligible && !state.completion_bonus_claimed;
        }
        SessionEvent::BonusClaimed(result) => state.bonus_claimed(result),
    }
    (state, commands)
}

fn start(selected: &[Subject], lessons: Vec<Lesson>, commands: &mut Vec<Command>) -> SessionState {
    let subjects = resolve_subjects(selected, &lessons);
    if subjects.is_empty() {
        return SessionState {
            status: SessionStatus::Failed {
                message: NO_SUBJECTS_MESSAGE.to_string(),
            },
            ..SessionState::default()
        };
    }

    commands.push(Command::FetchContent {
        subjects: subjects.clone(),
        lessons,
    });
    SessionState {
        status: SessionStatus::Loading,
        subjects,
        ..SessionState::default()
    }
}

impl SessionState {
    fn content_loaded(&mut self, result: Result<HashMap<Subject, Reminder>, String>) {
        if self.status != SessionStatus::Loading {
            return;
        }

        let mut content = match result {
            Ok(content) => content,
            Err(message) => {
                self.status = SessionStatus::Failed { message };
                return;
            }
        };

        let mut reminders = Vec::with_capacity(self.subjects.len());
        for subject in &self.subjects {
            let Some(reminder) = content.remove(subject) else {
                self.status = SessionStatus::Failed {
                    message: format!("No study content was generated for {subject}."),
                };
                return;
            };
            reminders.push(reminder);
        }

        self.reminders = reminders;
        self.subject_index = 0;
        self.task_index = 0;
        self.page = Page::Theory1;
        self.selected = None;
        self.status = SessionStatus::Active;
    }

    fn submit_answer(&mut self, option: usize, commands: &mut Vec<Command>) {
        if self.page != Page::Task || self.selected.is_some() {
            return;
        }
        let Some(task) = self.current_task() else {
            return;
        };
        if option >= task.options().len() {
            return;
        }
        let correct = task.is_correct(option);
        let Some(key) = self.question_key(self.subject_index, self.task_index) else {
            return;
        };

        self.selected = Some(option);
        self.selections.insert(key.clone(), option);

        if self.awarded_questions.insert(key.clone()) {
            let amount = answer_reward(correct);
            self.coins_earned = self.coins_earned.saturating_add(amount);
            self.answered_total = self.answered_total.saturating_add(1);
            let score = self.subject_scores.entry(key.subject.clone()).or_default();
            score.total = score.total.saturating_add(1);
            if correct {
                self.correct_total = self.correct_total.saturating_add(1);
                score.correct = score.correct.saturating_add(1);
            }
            commands.push(Command::AwardCoins {
                reason: AwardReason::Answer(key),
                amount,
            });
        }

        self.page = Page::Explanation;
    }

    fn advance(&mut self, commands: &mut Vec<Command>) {
        match self.page {
            Page::Theory1 => self.page = Page::Theory2,
            Page::Theory2 => {
                if self.current_task_count() == 0 {
                    self.leave_subject(commands);
                } else {
                    self.task_index = 0;
                    self.selected = None;
                    self.page = Page::Task;
                }
            }
            Page::Explanation => {
                if self.task_index + 1 < self.current_task_count() {
                    self.task_index += 1;
                    self.selected = None;
                    self.page = Page::Task;
                } else {
                    self.leave_subject(commands);
                }
            }
            Page::Task | Page::Completion => {}
        }
    }

    fn retreat(&mut self) {
        match self.page {
            Page::Task => {
                if self.task_index > 0 {
                    self.task_index -= 1;
                    self.show_explanation();
                }
            }
            Page::Explanation => {
                self.selected = None;
                self.page = Page::Task;
            }
            Page::Theory2 => self.page = Page::Theory1,
            Page::Theory1 => {
                if self.subject_index == 0 {
                    return;
                }
                self.subject_index -= 1;
                let task_count = self.current_task_count();
                if task_count == 0 {
                    self.task_index = 0;
                    self.selected = None;
                    self.page = Page::Theory2;
                } else {
                    self.task_index = task_count - 1;
                    self.show_explanation();
                }
            }
            Page::Completion => {}
        }
    }

    fn claim_bonus(&mut self, commands: &mut Vec<Command>) {
        if self.page != Page::Completion || !self.can_claim_completion_bonus() {
            return;
        }
        self.claim_in_flight = true;
        self.can_claim_completion_bonus = false;
        commands.push(Command::ClaimCompletionBonus);
    }

    fn bonus_claimed(&mut self, result: ClaimResult) {
        if !self.claim_in_flight {
            return;
        }
        self.claim_in_flight = false;
        match result {
            ClaimResult::Granted { new_total } => {
                self.coins_earned = self.coins_earned.saturating_add(COMPLETION_BONUS);
                self.completion_bonus_claimed = true;
                self.ledger_balance = Some(new_total);
            }
            ClaimResult::Rejected => {}
            ClaimResult::Failed => self.can_claim_completion_bonus = true,
        }
    }

    /// Runs the subject's completion side effects and moves to the next
    /// subject, or to the completion page after the last one.
    fn leave_subject(&mut self, commands: &mut Vec<Command>) {
        self.finish_subject(commands);

        if self.subject_index + 1 < self.subjects.len() {
            self.subject_index += 1;
            self.task_index = 0;
            self.selected = None;
            self.page = Page::Theory1;
        } else {
            self.selected = None;
            self.page = Page::Completion;
            if !self.completion_checked {
                self.completion_checked = true;
                commands.push(Command::CheckCompletionBonus {
                    expected_subjects: self.subjects.len(),
                });
            }
        }
    }

    fn finish_subject(&mut self, commands: &mut Vec<Command>) {
        let Some(subject) = self.current_subject().cloned() else {
            return;
        };
        if !self.finished_subjects.insert(subject.clone()) {
            return;
        }
        commands.push(Command::MarkSubjectCompleted {
            subject: subject.clone(),
        });

        let task_count = self.current_task_count();
        let score = self.subject_score(&subject);
        let perfect = task_count == PERFECT_SCORE_TASK_COUNT
            && usize::try_from(score.correct).is_ok_and(|correct| correct == task_count);
        if perfect && self.awarded_bonuses.insert(subject.clone()) {
            self.coins_earned = self.coins_earned.saturating_add(PERFECT_SCORE_BONUS);
            commands.push(Command::AwardCoins {
                reason: AwardReason::PerfectScore(subject),
                amount: PERFECT_SCORE_BONUS,
            });
        }
    }

    fn show_explanation(&mut self) {
        self.selected = self
            .question_key(self.subject_index, self.task_index)
            .and_then(|key| self.selections.get(&key).copied());
        self.page = Page::Explanation;
    }

    fn current_task_count(&self) -> usize {
        self.current_reminder().map_or(0, Reminder::task_count)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
