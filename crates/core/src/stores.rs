//! Collaborator seams for recipe, shopping-list, and history storage.
//!
//! The engine consumes these traits only; `mealweek-db` provides the SQLite
//! implementations. Every method is owner-scoped: a store must never return
//! another user's rows, even when handed that user's ids explicitly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::history::{DecisionStatus, HistoryRecord, UsedRecipe};
use crate::domain::recipe::{Recipe, RecipeId, UserId};
use crate::errors::PlannerError;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<StoreError> for PlannerError {
    fn from(value: StoreError) -> Self {
        PlannerError::Persistence(value.to_string())
    }
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// A user's recipes ordered starred-first, then newest-first. `limit`
    /// bounds the corpus and `ingredient_limit` bounds each ingredient
    /// list; `None` means unbounded (used by the alternatives flow).
    async fn recipes_for_user(
        &self,
        user: UserId,
        limit: Option<u32>,
        ingredient_limit: Option<u32>,
    ) -> Result<Vec<Recipe>, StoreError>;

    /// Full detail for exactly the given ids, scoped to `user`. Ids that do
    /// not exist or belong to someone else are absent from the result.
    async fn recipes_by_ids(
        &self,
        ids: &[RecipeId],
        user: UserId,
    ) -> Result<Vec<Recipe>, StoreError>;
}

#[async_trait]
pub trait CheckedItemsStore: Send + Sync {
    /// Lowercased names of shopping-list items the user has already
    /// checked off, bounded by `limit`.
    async fn checked_ingredient_names(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append one decision event. Duplicates are expected and meaningful;
    /// the most recent record per recipe wins during weighting.
    async fn record_decision(
        &self,
        user: UserId,
        recipe: RecipeId,
        status: DecisionStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Records with `plan_date >= since`, ordered by `plan_date` descending.
    async fn history_since(
        &self,
        user: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryRecord>, StoreError>;

    /// Delete records of any user with `created_at < cutoff`; returns the
    /// number deleted. Safe to call concurrently and repeatedly.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Delete all of a user's records; returns the number deleted.
    async fn reset_for_user(&self, user: UserId) -> Result<u64, StoreError>;

    /// Display rows for every history record, newest first.
    async fn list_used_recipes(&self, user: UserId) -> Result<Vec<UsedRecipe>, StoreError>;
}
