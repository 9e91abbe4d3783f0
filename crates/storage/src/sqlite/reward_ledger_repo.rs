use async_trait::async_trait;
use sqlx::Row;
use study_core::model::{Subject, UserId};
use study_core::rewards::COMPLETION_BONUS;

use super::SqliteRepository;
use super::mapping::{coins_from_i64, conn, ser};
use crate::repository::{ClaimOutcome, RewardLedger, StorageError};

/// Increment inside any executor; returns the new balance.
async fn credit<'e, E>(executor: E, user: &UserId, delta: u32) -> Result<u64, StorageError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let row = sqlx::query(
        r"
            INSERT INTO coin_balances (user_id, coins)
            VALUES (?1, ?2)
            ON CONFLICT(user_id) DO UPDATE SET coins = coins + excluded.coins
            RETURNING coins
        ",
    )
    .bind(user.as_str())
    .bind(i64::from(delta))
    .fetch_one(executor)
    .await
    .map_err(conn)?;

    coins_from_i64(row.try_get::<i64, _>("coins").map_err(ser)?)
}

async fn balance<'e, E>(executor: E, user: &UserId) -> Result<u64, StorageError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let row = sqlx::query("SELECT coins FROM coin_balances WHERE user_id = ?1")
        .bind(user.as_str())
        .fetch_optional(executor)
        .await
        .map_err(conn)?;

    match row {
        Some(row) => coins_from_i64(row.try_get::<i64, _>("coins").map_err(ser)?),
        None => Ok(0),
    }
}

#[async_trait]
impl RewardLedger for SqliteRepository {
    async fn add_coins(&self, user: &UserId, delta: u32) -> Result<u64, StorageError> {
        credit(&self.pool, user, delta).await
    }

    async fn coin_balance(&self, user: &UserId) -> Result<u64, StorageError> {
        balance(&self.pool, user).await
    }

    async fn mark_subject_completed(
        &self,
        user: &UserId,
        subject: &Subject,
    ) -> Result<(), StorageError> {
        let day = self.clock.today();
        sqlx::query(
            r"
                INSERT OR IGNORE INTO subject_completions (user_id, day, subject, recorded_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(user.as_str())
        .bind(day)
        .bind(subject.as_str())
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn are_all_daily_tasks_completed(
        &self,
        user: &UserId,
        expected_count: usize,
    ) -> Result<bool, StorageError> {
        let day = self.clock.today();
        let row = sqlx::query(
            r"
                SELECT COUNT(*) AS completed
                FROM subject_completions
                WHERE user_id = ?1 AND day = ?2
            ",
        )
        .bind(user.as_str())
        .bind(day)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let completed: i64 = row.try_get("completed").map_err(ser)?;
        let completed = usize::try_from(completed).map_err(ser)?;
        Ok(completed >= expected_count)
    }

    async fn has_claimed_completion_bonus(&self, user: &UserId) -> Result<bool, StorageError> {
        let day = self.clock.today();
        let row = sqlx::query(
            "SELECT 1 FROM completion_bonus_claims WHERE user_id = ?1 AND day = ?2",
        )
        .bind(user.as_str())
        .bind(day)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        Ok(row.is_some())
    }

    async fn claim_completion_bonus(&self, user: &UserId) -> Result<ClaimOutcome, StorageError> {
        let day = self.clock.today();
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let inserted = sqlx::query(
            r"
                INSERT OR IGNORE INTO completion_bonus_claims (user_id, day, amount, claimed_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(user.as_str())
        .bind(day)
        .bind(i64::from(COMPLETION_BONUS))
        .bind(self.clock.now())
        .execute(&mut *tx)
        .await
        .map_err(conn)?
        .rows_affected();

        if inserted == 0 {
            let new_total = balance(&mut *tx, user).await?;
            tx.rollback().await.map_err(conn)?;
            tracing::debug!(user = %user, %day, "completion bonus already claimed");
            return Ok(ClaimOutcome {
                success: false,
                new_total,
            });
        }

        let new_total = credit(&mut *tx, user, COMPLETION_BONUS).await?;
        tx.commit().await.map_err(conn)?;
        tracing::info!(user = %user, %day, new_total, "completion bonus claimed");

        Ok(ClaimOutcome {
            success: true,
            new_total,
        })
    }
}
