//! Weekly-plan engine: weighting, candidate selection, prompt/parse, and
//! the plan/alternative orchestration flows.

mod alternatives;
mod candidates;
mod engine;
pub mod parse;
pub mod prompt;
pub mod scoring;
#[cfg(test)]
pub(crate) mod testing;
mod weights;

pub use alternatives::{AlternativeGenerator, AlternativeIngredient, AlternativeRecipe};
pub use candidates::{CandidateSelector, CandidateSet, RecipeCandidate};
pub use engine::{PlanGenerator, PlannedIngredient, PlannedRecipe, WeeklyPlan};
pub use weights::{calculate_recipe_weights, RecipeWeight};

use serde::{Deserialize, Serialize};

/// Tuning table for the planner. Negative status weights deprioritize,
/// positive ones prefer; the behavioral contract is the relative ordering
/// (never-used above everything, accepted penalized hardest), enforced by
/// `AppConfig::validate`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannerWeights {
    /// Latest record is `accepted`: already eaten this recently.
    pub recently_accepted: i32,
    /// Latest record is `rejected`.
    pub recently_rejected: i32,
    /// Latest record is `suggested`: shown but not acted on.
    pub recently_suggested: i32,
    /// Added on top of the history branch for starred recipes.
    pub starred_bonus: i32,
    /// No history at all inside the lookback window.
    pub never_used: i32,
    /// History window consulted when weighting, in weeks.
    pub lookback_weeks: u32,
    /// Age beyond which history records are purged, in days.
    pub history_retention_days: u32,
    /// Corpus bound for a planning request.
    pub max_recipes: u32,
    /// Per-recipe ingredient bound for a planning request.
    pub max_ingredients_per_recipe: u32,
    /// Candidates forwarded to the oracle; a cost/latency control on
    /// prompt size, not a correctness requirement.
    pub prompt_candidate_limit: usize,
    /// Checked shopping-list ingredients listed inside the plan prompt.
    pub prompt_ingredient_limit: usize,
    /// Checked shopping-list items consulted per request.
    pub checked_item_limit: u32,
    /// Recipes per weekly plan.
    pub plan_size: usize,
    /// Replacements per alternatives request.
    pub alternative_count: usize,
    /// Overall soft deadline for one planning request, in seconds.
    pub request_deadline_secs: u64,
}

impl Default for PlannerWeights {
    fn default() -> Self {
        Self {
            recently_accepted: -50,
            recently_rejected: -20,
            recently_suggested: -10,
            starred_bonus: 10,
            never_used: 30,
            lookback_weeks: 4,
            history_retention_days: 30,
            max_recipes: 100,
            max_ingredients_per_recipe: 20,
            prompt_candidate_limit: 20,
            prompt_ingredient_limit: 10,
            checked_item_limit: 50,
            plan_size: 5,
            alternative_count: 3,
            request_deadline_secs: 25,
        }
    }
}
