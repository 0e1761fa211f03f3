//! In-memory collaborators shared by the engine and alternatives tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::history::{DecisionStatus, HistoryRecord, UsedRecipe};
use crate::domain::recipe::{Recipe, RecipeId, RecipeIngredient, UserId};
use crate::oracle::{OracleError, RankingOracle};
use crate::stores::{CheckedItemsStore, HistoryStore, RecipeStore, StoreError};

pub fn recipe_with_months(id: i64, starred: bool, months: &[u32]) -> Recipe {
    Recipe {
        id: RecipeId(id),
        title: format!("Recipe {id}"),
        description: format!("Description {id}"),
        url: format!("https://example.test/r/{id}"),
        image: None,
        starred,
        ingredients: vec![RecipeIngredient {
            name: format!("ingredient-{id}"),
            english_name: None,
            quantity: 1.0,
            unit: "unit".to_string(),
            season_months: months.iter().copied().collect(),
        }],
    }
}

pub struct MemRecipeStore {
    recipes: Vec<Recipe>,
}

impl MemRecipeStore {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }
}

#[async_trait]
impl RecipeStore for MemRecipeStore {
    async fn recipes_for_user(
        &self,
        _user: UserId,
        limit: Option<u32>,
        _ingredient_limit: Option<u32>,
    ) -> Result<Vec<Recipe>, StoreError> {
        let mut recipes = self.recipes.clone();
        if let Some(limit) = limit {
            recipes.truncate(limit as usize);
        }
        Ok(recipes)
    }

    async fn recipes_by_ids(
        &self,
        ids: &[RecipeId],
        _user: UserId,
    ) -> Result<Vec<Recipe>, StoreError> {
        Ok(self.recipes.iter().filter(|r| ids.contains(&r.id)).cloned().collect())
    }
}

#[derive(Default)]
pub struct MemHistoryStore {
    records: Mutex<Vec<(UserId, HistoryRecord)>>,
    fail_writes: bool,
    purge_calls: AtomicU64,
}

impl MemHistoryStore {
    pub fn failing_writes() -> Self {
        Self { fail_writes: true, ..Self::default() }
    }

    pub fn purge_calls(&self) -> u64 {
        self.purge_calls.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<(UserId, RecipeId, DecisionStatus)> {
        self.records
            .lock()
            .expect("history lock")
            .iter()
            .map(|(user, record)| (*user, record.recipe_id, record.status))
            .collect()
    }
}

#[async_trait]
impl HistoryStore for MemHistoryStore {
    async fn record_decision(
        &self,
        user: UserId,
        recipe: RecipeId,
        status: DecisionStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Database("disk full".to_string()));
        }
        self.records
            .lock()
            .expect("history lock")
            .push((user, HistoryRecord { recipe_id: recipe, status, plan_date: at }));
        Ok(())
    }

    async fn history_since(
        &self,
        user: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryRecord>, StoreError> {
        let mut records: Vec<HistoryRecord> = self
            .records
            .lock()
            .expect("history lock")
            .iter()
            .filter(|(owner, record)| *owner == user && record.plan_date >= since)
            .map(|(_, record)| record.clone())
            .collect();
        records.sort_by(|a, b| b.plan_date.cmp(&a.plan_date));
        Ok(records)
    }

    async fn purge_older_than(&self, _cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        self.purge_calls.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }

    async fn reset_for_user(&self, user: UserId) -> Result<u64, StoreError> {
        let mut records = self.records.lock().expect("history lock");
        let before = records.len();
        records.retain(|(owner, _)| *owner != user);
        Ok((before - records.len()) as u64)
    }

    async fn list_used_recipes(&self, _user: UserId) -> Result<Vec<UsedRecipe>, StoreError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct MemCheckedItems {
    pub names: Vec<String>,
}

#[async_trait]
impl CheckedItemsStore for MemCheckedItems {
    async fn checked_ingredient_names(
        &self,
        _user: UserId,
        limit: u32,
    ) -> Result<Vec<String>, StoreError> {
        Ok(self.names.iter().take(limit as usize).cloned().collect())
    }
}

pub struct ScriptedOracle {
    responses: Mutex<VecDeque<Result<String, OracleError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn replying(responses: Vec<Result<String, OracleError>>) -> Self {
        Self { responses: Mutex::new(responses.into()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt lock").clone()
    }
}

#[async_trait]
impl RankingOracle for ScriptedOracle {
    async fn rank(
        &self,
        prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, OracleError> {
        self.prompts.lock().expect("prompt lock").push(prompt.to_string());
        self.responses
            .lock()
            .expect("response lock")
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Transport("no scripted response".to_string())))
    }
}
