//! Alternative generation: replace one rejected recipe with exactly three
//! oracle-scored substitutes drawn from the rest of the corpus.
//!
//! Unlike the weekly-plan flow there is no deterministic fallback here:
//! oracle or parse failures surface as typed errors, and an id the oracle
//! invented is a hard `NotFound` rather than a silent substitution.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::candidates::display_title;
use super::parse::parse_alternative_selections;
use super::prompt::{build_alternatives_prompt, AlternativePromptRecipe};
use super::PlannerWeights;
use crate::domain::recipe::{Recipe, RecipeId, UserId};
use crate::errors::PlannerError;
use crate::oracle::RankingOracle;
use crate::stores::RecipeStore;

const ALTERNATIVES_MAX_TOKENS: u32 = 1500;
const ALTERNATIVES_TEMPERATURE: f32 = 0.3;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub seasons: Vec<u32>,
}

/// A substitute recipe with the oracle's reasoning and 0-10 sub-scores.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeRecipe {
    pub id: RecipeId,
    pub title: String,
    pub description: String,
    pub url: String,
    pub image: Option<String>,
    pub starred: bool,
    pub ingredients: Vec<AlternativeIngredient>,
    pub reasoning: String,
    pub seasonal_score: f64,
    pub health_score: f64,
    pub ingredient_efficiency_score: f64,
}

pub struct AlternativeGenerator {
    recipes: Arc<dyn RecipeStore>,
    oracle: Arc<dyn RankingOracle>,
    weights: PlannerWeights,
}

impl AlternativeGenerator {
    pub fn new(
        recipes: Arc<dyn RecipeStore>,
        oracle: Arc<dyn RankingOracle>,
        weights: PlannerWeights,
    ) -> Self {
        Self { recipes, oracle, weights }
    }

    pub async fn generate(
        &self,
        user: UserId,
        rejected: RecipeId,
        current_plan: &[RecipeId],
    ) -> Result<Vec<AlternativeRecipe>, PlannerError> {
        // The full corpus goes to the oracle here; this is a one-shot
        // request, not bounded to top-N like the weekly plan prompt.
        let corpus = self.recipes.recipes_for_user(user, None, None).await?;

        let available: Vec<Recipe> = corpus
            .into_iter()
            .filter(|recipe| recipe.id != rejected && !current_plan.contains(&recipe.id))
            .collect();

        if available.is_empty() {
            return Err(PlannerError::NoAlternatives);
        }

        let month = Utc::now().month();
        let prompt_recipes: Vec<AlternativePromptRecipe> =
            available.iter().map(AlternativePromptRecipe::from_recipe).collect();
        let prompt = build_alternatives_prompt(
            &prompt_recipes,
            rejected.0,
            month,
            self.weights.alternative_count,
        );

        let text = self
            .oracle
            .rank(&prompt, ALTERNATIVES_MAX_TOKENS, ALTERNATIVES_TEMPERATURE)
            .await
            .map_err(|error| {
                warn!(
                    event_name = "planner.alternatives.oracle_failed",
                    user_id = user.0,
                    rejected_recipe_id = rejected.0,
                    error = %error,
                    "alternatives oracle call failed"
                );
                PlannerError::from(error)
            })?;

        let selections =
            parse_alternative_selections(&text, self.weights.alternative_count)
                .map_err(PlannerError::Parse)?;

        let alternatives = selections
            .into_iter()
            .map(|selection| {
                let id = RecipeId(selection.recipe_id);
                let recipe = available
                    .iter()
                    .find(|recipe| recipe.id == id)
                    .ok_or(PlannerError::NotFound(id))?;

                Ok(AlternativeRecipe {
                    id: recipe.id,
                    title: display_title(&recipe.title),
                    description: recipe.description.clone(),
                    url: recipe.url.clone(),
                    image: recipe.image.clone(),
                    starred: recipe.starred,
                    ingredients: recipe
                        .ingredients
                        .iter()
                        .map(|ingredient| AlternativeIngredient {
                            name: ingredient.name.clone(),
                            quantity: ingredient.quantity,
                            unit: ingredient.unit.clone(),
                            seasons: ingredient.season_months.iter().copied().collect(),
                        })
                        .collect(),
                    reasoning: selection.reasoning,
                    seasonal_score: selection.seasonal_score,
                    health_score: selection.health_score,
                    ingredient_efficiency_score: selection.ingredient_efficiency_score,
                })
            })
            .collect::<Result<Vec<_>, PlannerError>>()?;

        info!(
            event_name = "planner.alternatives.generated",
            user_id = user.0,
            rejected_recipe_id = rejected.0,
            pool_size = available.len(),
            "alternative recipes generated"
        );

        Ok(alternatives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::OracleError;
    use crate::planner::testing::{recipe_with_months, MemRecipeStore, ScriptedOracle};

    fn selection_json(ids: &[i64]) -> String {
        let selections: Vec<String> = ids
            .iter()
            .map(|id| {
                format!(
                    r#"{{"recipeId": {id}, "reasoning": "seasonal and balanced", "seasonalScore": 6, "healthScore": 8, "ingredientEfficiencyScore": 4}}"#
                )
            })
            .collect();
        format!(r#"{{"alternativeRecipes": [{}]}}"#, selections.join(","))
    }

    fn generator_with(
        recipe_ids: std::ops::RangeInclusive<i64>,
        oracle: ScriptedOracle,
    ) -> AlternativeGenerator {
        let recipes = recipe_ids.map(|id| recipe_with_months(id, false, &[])).collect();
        AlternativeGenerator::new(
            Arc::new(MemRecipeStore::new(recipes)),
            Arc::new(oracle),
            PlannerWeights::default(),
        )
    }

    #[tokio::test]
    async fn excludes_rejected_and_current_plan_from_pool() {
        let oracle = ScriptedOracle::replying(vec![Ok(selection_json(&[11, 12, 13]))]);
        let generator = generator_with(1..=15, oracle);

        let plan: Vec<RecipeId> = (7..=10).map(RecipeId).collect();
        let alternatives =
            generator.generate(UserId(1), RecipeId(42), &plan).await.unwrap();

        assert_eq!(alternatives.len(), 3);
        let ids: Vec<i64> = alternatives.iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![11, 12, 13]);
    }

    #[tokio::test]
    async fn prompt_omits_filtered_recipes() {
        let oracle = ScriptedOracle::replying(vec![Ok(selection_json(&[3, 4, 5]))]);
        let recipes = (1..=5).map(|id| recipe_with_months(id, false, &[])).collect();
        let oracle = Arc::new(oracle);
        let generator = AlternativeGenerator::new(
            Arc::new(MemRecipeStore::new(recipes)),
            oracle.clone(),
            PlannerWeights::default(),
        );

        generator
            .generate(UserId(1), RecipeId(1), &[RecipeId(2)])
            .await
            .unwrap();

        let prompts = oracle.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(!prompts[0].contains("\"id\": 1,"));
        assert!(!prompts[0].contains("\"id\": 2,"));
        assert!(prompts[0].contains("Rejected recipe ID: 1"));
    }

    #[tokio::test]
    async fn empty_pool_fails_with_no_alternatives() {
        let oracle = ScriptedOracle::replying(vec![Ok(selection_json(&[1, 2, 3]))]);
        let generator = generator_with(1..=3, oracle);

        let plan = vec![RecipeId(2), RecipeId(3)];
        let result = generator.generate(UserId(1), RecipeId(1), &plan).await;

        assert_eq!(result.err(), Some(PlannerError::NoAlternatives));
    }

    #[tokio::test]
    async fn oracle_failure_is_a_hard_error() {
        let oracle = ScriptedOracle::replying(vec![Err(OracleError::Timeout)]);
        let generator = generator_with(1..=10, oracle);

        let result = generator.generate(UserId(1), RecipeId(1), &[]).await;
        assert_eq!(result.err(), Some(PlannerError::OracleTimeout));
    }

    #[tokio::test]
    async fn wrong_selection_count_is_a_parse_error() {
        let oracle = ScriptedOracle::replying(vec![Ok(selection_json(&[2, 3]))]);
        let generator = generator_with(1..=10, oracle);

        let result = generator.generate(UserId(1), RecipeId(1), &[]).await;
        assert!(matches!(result, Err(PlannerError::Parse(_))));
    }

    #[tokio::test]
    async fn hallucinated_id_is_not_found() {
        let oracle = ScriptedOracle::replying(vec![Ok(selection_json(&[2, 3, 999]))]);
        let generator = generator_with(1..=10, oracle);

        let result = generator.generate(UserId(1), RecipeId(1), &[]).await;
        assert_eq!(result.err(), Some(PlannerError::NotFound(RecipeId(999))));
    }

    #[tokio::test]
    async fn rejected_id_returned_by_oracle_is_not_found() {
        // The rejected recipe is filtered from the pool, so the oracle
        // naming it must fail rather than silently reintroduce it.
        let oracle = ScriptedOracle::replying(vec![Ok(selection_json(&[1, 2, 3]))]);
        let generator = generator_with(1..=10, oracle);

        let result = generator.generate(UserId(1), RecipeId(1), &[]).await;
        assert_eq!(result.err(), Some(PlannerError::NotFound(RecipeId(1))));
    }
}
