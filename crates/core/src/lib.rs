//! Weekly-plan recommendation engine.
//!
//! This crate holds the decision logic of the meal planner: history-driven
//! recipe weighting, candidate selection, oracle prompt construction and
//! response parsing, and the plan/alternative orchestration flows. All I/O
//! lives behind the seams in [`stores`] and [`oracle`]; the SQLite and HTTP
//! implementations are provided by the `mealweek-db` and `mealweek-oracle`
//! crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod oracle;
pub mod planner;
pub mod stores;

pub use domain::history::{DecisionStatus, HistoryRecord, UsedRecipe};
pub use domain::recipe::{Recipe, RecipeId, RecipeIngredient, UserId};
pub use errors::PlannerError;
pub use oracle::{OracleError, RankingOracle};
pub use stores::{CheckedItemsStore, HistoryStore, RecipeStore, StoreError};
pub use planner::{
    AlternativeGenerator, AlternativeRecipe, CandidateSelector, PlanGenerator, PlannedRecipe,
    PlannerWeights, RecipeWeight, WeeklyPlan,
};
