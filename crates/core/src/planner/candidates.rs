//! Candidate selection: pull a user's corpus, weight it against recent
//! history, attach seasonal scores, and narrow to a bounded set for the
//! oracle prompt.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::warn;

use super::weights::calculate_recipe_weights;
use super::PlannerWeights;
use crate::domain::recipe::{Recipe, RecipeId, UserId};
use crate::errors::PlannerError;
use crate::stores::{CheckedItemsStore, HistoryStore, RecipeStore};

/// A recipe enriched for ranking; ephemeral, rebuilt per request.
#[derive(Clone, Debug, PartialEq)]
pub struct RecipeCandidate {
    pub id: RecipeId,
    pub title: String,
    pub starred: bool,
    pub weight: i32,
    pub weight_reason: String,
    pub seasonal_score: f64,
}

/// Output of one gathering pass. `candidates` is ranked and truncated for
/// the prompt; full recipe detail is re-fetched owner-scoped after the
/// oracle answers.
#[derive(Clone, Debug)]
pub struct CandidateSet {
    pub candidates: Vec<RecipeCandidate>,
    pub checked_ingredients: Vec<String>,
    pub total_recipes: usize,
    pub month: u32,
}

pub struct CandidateSelector {
    recipes: Arc<dyn RecipeStore>,
    history: Arc<dyn HistoryStore>,
    checked_items: Arc<dyn CheckedItemsStore>,
    weights: PlannerWeights,
}

impl CandidateSelector {
    pub fn new(
        recipes: Arc<dyn RecipeStore>,
        history: Arc<dyn HistoryStore>,
        checked_items: Arc<dyn CheckedItemsStore>,
        weights: PlannerWeights,
    ) -> Self {
        Self { recipes, history, checked_items, weights }
    }

    pub fn weights(&self) -> &PlannerWeights {
        &self.weights
    }

    /// Build the ranked candidate set for one planning request. Fails fast
    /// on an empty corpus; history and checked-item read failures degrade
    /// (empty window, empty list) rather than failing the request.
    pub async fn gather(
        &self,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<CandidateSet, PlannerError> {
        let recipes = self
            .recipes
            .recipes_for_user(
                user,
                Some(self.weights.max_recipes),
                Some(self.weights.max_ingredients_per_recipe),
            )
            .await?;

        if recipes.is_empty() {
            return Err(PlannerError::NoRecipes);
        }

        let checked_ingredients = match self
            .checked_items
            .checked_ingredient_names(user, self.weights.checked_item_limit)
            .await
        {
            Ok(names) => names,
            Err(error) => {
                warn!(
                    event_name = "planner.gather.checked_items_degraded",
                    user_id = user.0,
                    error = %error,
                    "checked-item read failed, continuing with empty list"
                );
                Vec::new()
            }
        };

        let lookback = now - Duration::weeks(i64::from(self.weights.lookback_weeks));
        let history = match self.history.history_since(user, lookback).await {
            Ok(records) => records,
            Err(error) => {
                warn!(
                    event_name = "planner.gather.history_degraded",
                    user_id = user.0,
                    error = %error,
                    "history read failed, weighting with empty window"
                );
                Vec::new()
            }
        };

        let starred: HashSet<RecipeId> =
            recipes.iter().filter(|r| r.starred).map(|r| r.id).collect();
        let recipe_ids: Vec<RecipeId> = recipes.iter().map(|r| r.id).collect();
        let ranked = calculate_recipe_weights(&recipe_ids, &history, &starred, &self.weights);

        let month = now.month();
        let by_id: HashMap<RecipeId, Recipe> =
            recipes.into_iter().map(|r| (r.id, r)).collect();

        let mut candidates: Vec<RecipeCandidate> = ranked
            .into_iter()
            .filter_map(|weight| {
                by_id.get(&weight.recipe_id).map(|recipe| RecipeCandidate {
                    id: recipe.id,
                    title: display_title(&recipe.title),
                    starred: recipe.starred,
                    weight: weight.weight,
                    weight_reason: weight.reason,
                    seasonal_score: recipe.seasonal_score(month),
                })
            })
            .collect();

        let total_recipes = by_id.len();
        candidates.truncate(self.weights.prompt_candidate_limit);

        Ok(CandidateSet { candidates, checked_ingredients, total_recipes, month })
    }
}

pub(crate) fn display_title(title: &str) -> String {
    if title.trim().is_empty() { "Untitled Recipe".to_string() } else { title.to_string() }
}
