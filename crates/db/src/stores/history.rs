use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use mealweek_core::{
    DecisionStatus, HistoryRecord, HistoryStore, RecipeId, StoreError, UsedRecipe, UserId,
};

use super::{db_error, decode_error};
use crate::DbPool;

pub struct SqlHistoryStore {
    pool: DbPool,
}

impl SqlHistoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_status(raw: &str) -> Result<DecisionStatus, StoreError> {
    raw.parse().map_err(decode_error)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(decode_error)
}

#[async_trait]
impl HistoryStore for SqlHistoryStore {
    async fn record_decision(
        &self,
        user: UserId,
        recipe: RecipeId,
        status: DecisionStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO weekly_plan_history (user_id, recipe_id, status, plan_date, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.0)
        .bind(recipe.0)
        .bind(status.as_str())
        .bind(at.to_rfc3339())
        .bind(at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn history_since(
        &self,
        user: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT recipe_id, status, plan_date
             FROM weekly_plan_history
             WHERE user_id = ? AND plan_date >= ?
             ORDER BY plan_date DESC, id DESC",
        )
        .bind(user.0)
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                let recipe_id: i64 = row.try_get("recipe_id").map_err(decode_error)?;
                let status: String = row.try_get("status").map_err(decode_error)?;
                let plan_date: String = row.try_get("plan_date").map_err(decode_error)?;
                Ok(HistoryRecord {
                    recipe_id: RecipeId(recipe_id),
                    status: parse_status(&status)?,
                    plan_date: parse_timestamp(&plan_date)?,
                })
            })
            .collect()
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM weekly_plan_history WHERE created_at < ?")
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn reset_for_user(&self, user: UserId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM weekly_plan_history WHERE user_id = ?")
            .bind(user.0)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn list_used_recipes(&self, user: UserId) -> Result<Vec<UsedRecipe>, StoreError> {
        let rows = sqlx::query(
            "SELECT h.recipe_id, h.status, h.plan_date,
                    IFNULL(r.title, '') AS title,
                    IFNULL(r.url, '') AS url,
                    r.image
             FROM weekly_plan_history h
             LEFT JOIN recipes r ON r.id = h.recipe_id AND r.user_id = h.user_id
             WHERE h.user_id = ?
             ORDER BY h.plan_date DESC, h.id DESC",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                let recipe_id: i64 = row.try_get("recipe_id").map_err(decode_error)?;
                let status: String = row.try_get("status").map_err(decode_error)?;
                let plan_date: String = row.try_get("plan_date").map_err(decode_error)?;
                Ok(UsedRecipe {
                    id: RecipeId(recipe_id),
                    title: row.try_get("title").map_err(decode_error)?,
                    image: row.try_get("image").map_err(decode_error)?,
                    url: row.try_get("url").map_err(decode_error)?,
                    status: parse_status(&status)?,
                    plan_date: parse_timestamp(&plan_date)?,
                })
            })
            .collect()
    }
}
