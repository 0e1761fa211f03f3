use sqlx::{Executor, Row};

use crate::connection::DbPool;

/// Deterministic demo dataset for local runs and end-to-end tests: one
/// user with a small seasonal recipe catalog, a partially checked
/// shopping list, and a short planning history.
pub struct SeedDataset;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub recipes: i64,
    pub ingredients: i64,
    pub history_records: i64,
}

impl SeedDataset {
    pub const DEMO_USER_ID: i64 = 1;

    /// SQL fixture content for the demo dataset.
    pub const SQL: &str = include_str!("../../../config/fixtures/seed_dataset.sql");

    /// Load the demo dataset into an empty, migrated database.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, sqlx::Error> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Self::counts(pool).await
    }

    pub async fn counts(pool: &DbPool) -> Result<SeedResult, sqlx::Error> {
        let recipes = scalar(pool, "SELECT COUNT(*) AS count FROM recipes").await?;
        let ingredients = scalar(pool, "SELECT COUNT(*) AS count FROM ingredients").await?;
        let history_records =
            scalar(pool, "SELECT COUNT(*) AS count FROM weekly_plan_history").await?;

        Ok(SeedResult { recipes, ingredients, history_records })
    }
}

async fn scalar(pool: &DbPool, sql: &str) -> Result<i64, sqlx::Error> {
    Ok(sqlx::query(sql).fetch_one(pool).await?.get::<i64, _>("count"))
}
