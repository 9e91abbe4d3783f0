use std::collections::HashSet;

use crate::model::{Lesson, Subject};

/// Resolve which subjects a session covers.
///
/// The selection is filtered to subjects that actually have lessons, keeping
/// the selection's order. An empty selection means every lesson subject, in
/// order of first occurrence. Duplicates are dropped either way.
#[must_use]
pub fn resolve_subjects(selected: &[Subject], lessons: &[Lesson]) -> Vec<Subject> {
    let mut seen = HashSet::new();

    if selected.is_empty() {
        return lessons
            .iter()
            .map(|lesson| &lesson.subject)
            .filter(|subject| seen.insert(*subject))
            .cloned()
            .collect();
    }

    let available: HashSet<&Subject> = lessons.iter().map(|lesson| &lesson.subject).collect();
    selected
        .iter()
        .filter(|subject| available.contains(subject))
        .filter(|subject| seen.insert(*subject))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_today;

    fn lesson(subject: &str) -> Lesson {
        Lesson::new(Subject::new(subject).unwrap(), "topic", "homework", fixed_today())
    }

    fn subjects(names: &[&str]) -> Vec<Subject> {
        names.iter().map(|name| Subject::new(*name).unwrap()).collect()
    }

    #[test]
    fn empty_selection_uses_first_occurrence_order() {
        let lessons = vec![lesson("A"), lesson("B"), lesson("A"), lesson("C")];
        assert_eq!(resolve_subjects(&[], &lessons), subjects(&["A", "B", "C"]));
    }

    #[test]
    fn selection_is_filtered_to_lesson_subjects() {
        let lessons = vec![lesson("Math"), lesson("History")];
        let selected = subjects(&["History", "Art", "Math", "History"]);
        assert_eq!(
            resolve_subjects(&selected, &lessons),
            subjects(&["History", "Math"])
        );
    }

    #[test]
    fn no_lessons_resolves_to_nothing() {
        assert!(resolve_subjects(&subjects(&["Math"]), &[]).is_empty());
        assert!(resolve_subjects(&[], &[]).is_empty());
    }
}
