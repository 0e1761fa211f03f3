//! Plan generation: gather candidates, ask the oracle, fall back
//! deterministically, persist `suggested` outcomes, format the plan.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::candidates::{display_title, CandidateSelector, CandidateSet};
use super::parse::parse_recipe_id_list;
use super::prompt::build_plan_prompt;
use super::scoring;
use crate::domain::history::DecisionStatus;
use crate::domain::recipe::{Recipe, RecipeId, UserId};
use crate::errors::PlannerError;
use crate::oracle::RankingOracle;
use crate::stores::{HistoryStore, RecipeStore};

const PLAN_MAX_TOKENS: u32 = 200;
const PLAN_TEMPERATURE: f32 = 0.1;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedIngredient {
    pub name: String,
    pub english_name: Option<String>,
    pub is_seasonal: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedRecipe {
    pub id: RecipeId,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub url: String,
    pub ingredients: Vec<PlannedIngredient>,
    pub seasonal_score: f64,
    pub health_score: u32,
    pub ingredient_efficiency_score: u32,
    pub reasoning: String,
}

/// Output of one planning request. The only durable side effect of
/// producing it is the batch of `suggested` history records.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlan {
    pub recipes: Vec<PlannedRecipe>,
    pub total_recipes: usize,
    pub checked_ingredients: Vec<String>,
    pub fallback_used: bool,
    pub generated_at: DateTime<Utc>,
}

pub struct PlanGenerator {
    selector: CandidateSelector,
    recipes: Arc<dyn RecipeStore>,
    history: Arc<dyn HistoryStore>,
    oracle: Arc<dyn RankingOracle>,
}

impl PlanGenerator {
    pub fn new(
        selector: CandidateSelector,
        recipes: Arc<dyn RecipeStore>,
        history: Arc<dyn HistoryStore>,
        oracle: Arc<dyn RankingOracle>,
    ) -> Self {
        Self { selector, recipes, history, oracle }
    }

    /// Generate a weekly plan for `user`. Stages run strictly in sequence
    /// with an overall soft deadline checked between them; oracle failures
    /// degrade to the deterministic weight-ranked fallback.
    pub async fn generate(&self, user: UserId) -> Result<WeeklyPlan, PlannerError> {
        let started = Instant::now();
        let now = Utc::now();
        let weights = self.selector.weights().clone();

        let set = self.selector.gather(user, now).await?;
        self.check_deadline(started, weights.request_deadline_secs)?;

        let prompt = build_plan_prompt(
            &set.candidates,
            &set.checked_ingredients,
            weights.prompt_ingredient_limit,
            set.month,
            weights.plan_size,
        );

        let (selected, fallback_used) =
            match self.oracle.rank(&prompt, PLAN_MAX_TOKENS, PLAN_TEMPERATURE).await {
                Ok(text) => match parse_recipe_id_list(&text, weights.plan_size) {
                    Ok(ids) => (ids, false),
                    Err(reason) => {
                        warn!(
                            event_name = "planner.oracle.unparsable",
                            user_id = user.0,
                            reason = %reason,
                            "oracle response unparsable, using fallback selection"
                        );
                        (fallback_selection(&set, weights.plan_size), true)
                    }
                },
                Err(error) => {
                    warn!(
                        event_name = "planner.oracle.unavailable",
                        user_id = user.0,
                        error = %error,
                        "oracle call failed, using fallback selection"
                    );
                    (fallback_selection(&set, weights.plan_size), true)
                }
            };

        self.check_deadline(started, weights.request_deadline_secs)?;

        // Owner-scoped re-fetch with full ingredient detail. Ids the oracle
        // hallucinated (unknown, or another user's) drop out here.
        let fetched = self.recipes.recipes_by_ids(&selected, user).await?;
        let by_id: HashMap<RecipeId, Recipe> =
            fetched.into_iter().map(|r| (r.id, r)).collect();
        let chosen: Vec<&Recipe> =
            selected.iter().filter_map(|id| by_id.get(id)).collect();

        if chosen.len() < selected.len() {
            warn!(
                event_name = "planner.selection.unresolved_ids",
                user_id = user.0,
                requested = selected.len(),
                resolved = chosen.len(),
                "dropping oracle-selected ids that did not resolve for this user"
            );
        }

        for recipe in &chosen {
            if let Err(error) = self
                .history
                .record_decision(user, recipe.id, DecisionStatus::Suggested, now)
                .await
            {
                warn!(
                    event_name = "planner.history.record_failed",
                    user_id = user.0,
                    recipe_id = recipe.id.0,
                    error = %error,
                    "failed to record suggested outcome, continuing"
                );
            }
        }

        let recipes = chosen
            .iter()
            .map(|recipe| format_planned_recipe(recipe, &set.checked_ingredients, set.month))
            .collect();

        info!(
            event_name = "planner.plan.generated",
            user_id = user.0,
            recipe_count = chosen.len(),
            fallback_used,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "weekly plan generated"
        );

        Ok(WeeklyPlan {
            recipes,
            total_recipes: set.total_recipes,
            checked_ingredients: set.checked_ingredients,
            fallback_used,
            generated_at: now,
        })
    }

    fn check_deadline(&self, started: Instant, deadline_secs: u64) -> Result<(), PlannerError> {
        if started.elapsed() > StdDuration::from_secs(deadline_secs) {
            return Err(PlannerError::RequestTimeout);
        }
        Ok(())
    }
}

/// Deterministic oracle-free selection: the top candidates already ranked
/// by weight (ties broken by recipe id during weighting).
fn fallback_selection(set: &CandidateSet, plan_size: usize) -> Vec<RecipeId> {
    set.candidates.iter().take(plan_size).map(|c| c.id).collect()
}

fn format_planned_recipe(
    recipe: &Recipe,
    checked_ingredients: &[String],
    month: u32,
) -> PlannedRecipe {
    PlannedRecipe {
        id: recipe.id,
        title: display_title(&recipe.title),
        description: recipe.description.clone(),
        image: recipe.image.clone(),
        url: recipe.url.clone(),
        ingredients: recipe
            .ingredients
            .iter()
            .map(|ingredient| PlannedIngredient {
                name: ingredient.name.clone(),
                english_name: ingredient.english_name.clone(),
                is_seasonal: ingredient.in_season(month),
            })
            .collect(),
        seasonal_score: recipe.seasonal_score(month),
        health_score: scoring::health_score(recipe, month),
        ingredient_efficiency_score: scoring::ingredient_efficiency_score(
            recipe,
            checked_ingredients,
        ),
        reasoning: scoring::reasoning(recipe, checked_ingredients, month),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::OracleError;
    use crate::planner::testing::{
        recipe_with_months, MemCheckedItems, MemHistoryStore, MemRecipeStore, ScriptedOracle,
    };
    use crate::planner::PlannerWeights;

    fn generator(
        recipes: Vec<Recipe>,
        oracle: ScriptedOracle,
    ) -> (PlanGenerator, Arc<MemHistoryStore>) {
        let recipe_store = Arc::new(MemRecipeStore::new(recipes));
        let history = Arc::new(MemHistoryStore::default());
        let selector = CandidateSelector::new(
            recipe_store.clone(),
            history.clone(),
            Arc::new(MemCheckedItems::default()),
            PlannerWeights::default(),
        );
        let generator =
            PlanGenerator::new(selector, recipe_store, history.clone(), Arc::new(oracle));
        (generator, history)
    }

    #[tokio::test]
    async fn no_recipes_fails_fast_without_history_writes() {
        let (generator, history) =
            generator(Vec::new(), ScriptedOracle::replying(vec![Ok("[1]".to_string())]));

        let result = generator.generate(UserId(1)).await;

        assert_eq!(result.err(), Some(PlannerError::NoRecipes));
        assert_eq!(history.recorded().len(), 0);
    }

    #[tokio::test]
    async fn oracle_selection_is_persisted_as_suggested() {
        let recipes = (1..=3).map(|id| recipe_with_months(id, false, &[])).collect();
        let (generator, history) =
            generator(recipes, ScriptedOracle::replying(vec![Ok("[1, 2, 3]".to_string())]));

        let plan = generator.generate(UserId(1)).await.unwrap();

        assert_eq!(plan.recipes.len(), 3);
        assert!(!plan.fallback_used);
        let recorded = history.recorded();
        assert_eq!(recorded.len(), 3);
        assert!(recorded.iter().all(|(_, _, status)| *status == DecisionStatus::Suggested));
    }

    #[tokio::test]
    async fn oracle_failure_uses_deterministic_fallback() {
        let recipes: Vec<Recipe> =
            (1..=20).map(|id| recipe_with_months(id, false, &[])).collect();
        let (generator, _) =
            generator(recipes.clone(), ScriptedOracle::replying(vec![Err(OracleError::Timeout)]));

        let plan = generator.generate(UserId(1)).await.unwrap();

        assert!(plan.fallback_used);
        assert_eq!(plan.recipes.len(), 5);
        // Equal weights everywhere, so the id-ascending tie-break decides.
        let ids: Vec<i64> = plan.recipes.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        // Same inputs, same fallback.
        let (generator, _) =
            generator_again(recipes, ScriptedOracle::replying(vec![Err(OracleError::Timeout)]));
        let repeat = generator.generate(UserId(1)).await.unwrap();
        let repeat_ids: Vec<i64> = repeat.recipes.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, repeat_ids);
    }

    fn generator_again(
        recipes: Vec<Recipe>,
        oracle: ScriptedOracle,
    ) -> (PlanGenerator, Arc<MemHistoryStore>) {
        generator(recipes, oracle)
    }

    #[tokio::test]
    async fn unparsable_oracle_text_uses_fallback() {
        let recipes = (1..=8).map(|id| recipe_with_months(id, false, &[])).collect();
        let (generator, _) = generator(
            recipes,
            ScriptedOracle::replying(vec![Ok("I would recommend hearty stews.".to_string())]),
        );

        let plan = generator.generate(UserId(1)).await.unwrap();

        assert!(plan.fallback_used);
        assert_eq!(plan.recipes.len(), 5);
    }

    #[tokio::test]
    async fn hallucinated_ids_are_dropped_and_not_recorded() {
        let recipes = vec![recipe_with_months(1, false, &[]), recipe_with_months(2, false, &[])];
        let (generator, history) =
            generator(recipes, ScriptedOracle::replying(vec![Ok("[1, 999]".to_string())]));

        let plan = generator.generate(UserId(1)).await.unwrap();

        assert_eq!(plan.recipes.len(), 1);
        assert_eq!(plan.recipes[0].id, RecipeId(1));
        assert_eq!(history.recorded().len(), 1);
    }

    #[tokio::test]
    async fn retention_sweep_stays_off_the_request_path() {
        let recipes = vec![recipe_with_months(1, false, &[])];
        let (generator, history) =
            generator(recipes, ScriptedOracle::replying(vec![Ok("[1]".to_string())]));

        generator.generate(UserId(1)).await.unwrap();

        assert_eq!(history.purge_calls(), 0);
    }

    #[tokio::test]
    async fn plan_never_exceeds_five_recipes() {
        let recipes = (1..=20).map(|id| recipe_with_months(id, false, &[])).collect();
        let (generator, _) = generator(
            recipes,
            ScriptedOracle::replying(vec![Ok("[1,2,3,4,5,6,7,8]".to_string())]),
        );

        let plan = generator.generate(UserId(1)).await.unwrap();
        assert_eq!(plan.recipes.len(), 5);
    }

    #[tokio::test]
    async fn pool_smaller_than_plan_size_returns_pool() {
        let recipes = (1..=3).map(|id| recipe_with_months(id, false, &[])).collect();
        let (generator, _) =
            generator(recipes, ScriptedOracle::replying(vec![Err(OracleError::Timeout)]));

        let plan = generator.generate(UserId(1)).await.unwrap();
        assert_eq!(plan.recipes.len(), 3);
    }

    #[tokio::test]
    async fn history_write_failure_does_not_fail_the_plan() {
        let recipes = vec![recipe_with_months(1, false, &[])];
        let recipe_store = Arc::new(MemRecipeStore::new(recipes));
        let history = Arc::new(MemHistoryStore::failing_writes());
        let selector = CandidateSelector::new(
            recipe_store.clone(),
            history.clone(),
            Arc::new(MemCheckedItems::default()),
            PlannerWeights::default(),
        );
        let generator = PlanGenerator::new(
            selector,
            recipe_store,
            history,
            Arc::new(ScriptedOracle::replying(vec![Ok("[1]".to_string())])),
        );

        let plan = generator.generate(UserId(1)).await.unwrap();
        assert_eq!(plan.recipes.len(), 1);
    }

    #[tokio::test]
    async fn exhausted_deadline_surfaces_request_timeout() {
        let recipes = vec![recipe_with_months(1, false, &[])];
        let recipe_store = Arc::new(MemRecipeStore::new(recipes));
        let history = Arc::new(MemHistoryStore::default());
        let weights = PlannerWeights { request_deadline_secs: 0, ..PlannerWeights::default() };
        let selector = CandidateSelector::new(
            recipe_store.clone(),
            history.clone(),
            Arc::new(MemCheckedItems::default()),
            weights,
        );
        let generator = PlanGenerator::new(
            selector,
            recipe_store,
            history,
            Arc::new(ScriptedOracle::replying(vec![Ok("[1]".to_string())])),
        );

        let result = generator.generate(UserId(1)).await;
        assert_eq!(result.err(), Some(PlannerError::RequestTimeout));
    }
}
