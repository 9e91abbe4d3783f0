use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Deserialize;
use study_core::model::{Difficulty, Lesson, Reminder, Subject, Task, Theory};

use crate::error::ContentError;

/// Number of tasks requested per subject.
const TASKS_PER_SUBJECT: usize = 3;

/// Build the generation prompt for the given subjects and their lessons.
#[must_use]
pub fn build_prompt(subjects: &[Subject], lessons: &[Lesson]) -> String {
    let mut prompt = String::from(
        "You are a tutor preparing a short daily reminder for a school student.\n\
         For every subject below write a brief theory recap and multiple-choice tasks \
         based on the lessons listed for it.\n\n",
    );

    for subject in subjects {
        let _ = writeln!(prompt, "Subject: {subject}");
        for lesson in lessons.iter().filter(|lesson| &lesson.subject == subject) {
            let _ = writeln!(
                prompt,
                "- {} ({}): topic \"{}\", homework \"{}\"",
                lesson.subject, lesson.date, lesson.topic, lesson.homework
            );
        }
        prompt.push('\n');
    }

    let _ = write!(
        prompt,
        "Answer with JSON only. Use the subject names above as keys:\n\
         {{\"<subject>\": {{\"theory\": {{\"content\": \"...\", \"keyPoints\": [\"...\"]}}, \
         \"tasks\": [{{\"difficulty\": \"easy|medium|hard\", \"question\": \"...\", \
         \"options\": [\"...\"], \"correctAnswer\": 0, \"explanation\": \"...\"}}]}}}}\n\
         Write exactly {TASKS_PER_SUBJECT} tasks per subject with four options each; \
         correctAnswer is the zero-based index of the right option."
    );
    prompt
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReminderPayload {
    theory: TheoryPayload,
    #[serde(default)]
    tasks: Vec<TaskPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TheoryPayload {
    content: String,
    #[serde(default)]
    key_points: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskPayload {
    difficulty: Difficulty,
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(default)]
    explanation: String,
}

/// Parse a generated response into validated reminders.
///
/// The response may be wrapped in a Markdown code fence.
///
/// # Errors
///
/// Returns `ContentError::Parse` for malformed JSON and
/// `ContentError::InvalidTask` when a task fails validation.
pub fn parse_reminders(raw: &str) -> Result<HashMap<Subject, Reminder>, ContentError> {
    let payload: HashMap<String, ReminderPayload> = serde_json::from_str(strip_code_fence(raw))?;

    let mut reminders = HashMap::with_capacity(payload.len());
    for (name, reminder) in payload {
        let subject = Subject::new(name)?;
        let tasks = reminder
            .tasks
            .into_iter()
            .map(|task| {
                Task::new(
                    task.question,
                    task.options,
                    task.correct_answer,
                    task.difficulty,
                    task.explanation,
                )
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ContentError::InvalidTask {
                subject: subject.to_string(),
                source,
            })?;
        let theory = Theory {
            content: reminder.theory.content,
            key_points: reminder.theory.key_points,
        };
        reminders.insert(subject, Reminder::new(theory, tasks));
    }
    Ok(reminders)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::TaskError;
    use study_core::time::fixed_today;

    const SAMPLE: &str = r#"{
        "Math": {
            "theory": {"content": "Fractions recap", "keyPoints": ["a/b", "common denominator"]},
            "tasks": [
                {"difficulty": "easy", "question": "1/2 + 1/2?", "options": ["1", "2"], "correctAnswer": 0, "explanation": "Two halves."},
                {"difficulty": "Hard", "question": "1/3 + 1/6?", "options": ["1/2", "2/9"], "correctAnswer": 0}
            ]
        }
    }"#;

    #[test]
    fn parses_reminders_with_defaults() {
        let reminders = parse_reminders(SAMPLE).unwrap();
        let math = &reminders[&Subject::new("Math").unwrap()];
        assert_eq!(math.theory().key_points.len(), 2);
        assert_eq!(math.task_count(), 2);
        assert_eq!(math.tasks()[1].difficulty(), Difficulty::Hard);
        assert_eq!(math.tasks()[1].explanation(), "");
    }

    #[test]
    fn strips_markdown_fence() {
        let fenced = format!("```json\n{SAMPLE}\n```");
        assert_eq!(parse_reminders(&fenced).unwrap().len(), 1);
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {} "), "{}");
    }

    #[test]
    fn rejects_out_of_range_answer() {
        let raw = r#"{"Art": {"theory": {"content": "c"}, "tasks": [
            {"difficulty": "medium", "question": "Q", "options": ["x"], "correctAnswer": 4}
        ]}}"#;
        match parse_reminders(raw).unwrap_err() {
            ContentError::InvalidTask { subject, source } => {
                assert_eq!(subject, "Art");
                assert_eq!(source, TaskError::CorrectAnswerOutOfRange { index: 4, len: 1 });
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            parse_reminders("Sorry, I cannot help with that."),
            Err(ContentError::Parse(_))
        ));
    }

    #[test]
    fn prompt_lists_lessons_under_their_subject() {
        let math = Subject::new("Math").unwrap();
        let lessons = vec![
            Lesson::new(math.clone(), "Fractions", "p. 12", fixed_today()),
            Lesson::new(Subject::new("Art").unwrap(), "Colors", "", fixed_today()),
        ];
        let prompt = build_prompt(&[math], &lessons);
        assert!(prompt.contains("Subject: Math"));
        assert!(prompt.contains("topic \"Fractions\""));
        assert!(!prompt.contains("Colors"));
        assert!(prompt.contains("exactly 3 tasks"));
    }
}
