use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Row;
use study_core::model::{Lesson, UserId};

use super::SqliteRepository;
use super::mapping::{conn, ser, subject_from_str};
use crate::repository::{LessonRepository, StorageError};

fn map_lesson_row(row: &sqlx::sqlite::SqliteRow) -> Result<Lesson, StorageError> {
    let subject = subject_from_str(row.try_get("subject").map_err(ser)?)?;
    let topic: String = row.try_get("topic").map_err(ser)?;
    let homework: String = row.try_get("homework").map_err(ser)?;
    let date: NaiveDate = row.try_get("date").map_err(ser)?;
    Ok(Lesson::new(subject, topic, homework, date))
}

#[async_trait]
impl LessonRepository for SqliteRepository {
    async fn insert_lesson(&self, user: &UserId, lesson: &Lesson) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO lessons (user_id, subject, topic, homework, date)
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(user.as_str())
        .bind(lesson.subject.as_str())
        .bind(&lesson.topic)
        .bind(&lesson.homework)
        .bind(lesson.date)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_lessons(
        &self,
        user: &UserId,
        day: NaiveDate,
    ) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT subject, topic, homework, date
                FROM lessons
                WHERE user_id = ?1 AND date = ?2
                ORDER BY id ASC
            ",
        )
        .bind(user.as_str())
        .bind(day)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_lesson_row).collect()
    }
}
