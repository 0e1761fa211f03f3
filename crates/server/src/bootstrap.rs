use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use mealweek_core::config::{AppConfig, ConfigError, LoadOptions};
use mealweek_core::planner::{AlternativeGenerator, CandidateSelector, PlanGenerator};
use mealweek_core::{CheckedItemsStore, HistoryStore, RankingOracle, RecipeStore};
use mealweek_db::{connect_with_settings, migrations, DbPool};
use mealweek_db::{SqlHistoryStore, SqlRecipeStore, SqlShoppingListStore};
use mealweek_oracle::AnthropicOracle;

use crate::api::ApiState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub api_state: ApiState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("oracle client construction failed: {0}")]
    Oracle(String),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let api_key = config
        .llm
        .api_key
        .clone()
        .ok_or_else(|| BootstrapError::Oracle("llm.api_key is not configured".to_string()))?;
    let oracle: Arc<dyn RankingOracle> = Arc::new(
        AnthropicOracle::new(
            api_key,
            config.llm.base_url.clone(),
            config.llm.model.clone(),
            config.llm.timeout_secs,
        )
        .map_err(|err| BootstrapError::Oracle(err.to_string()))?,
    );

    let recipes: Arc<dyn RecipeStore> = Arc::new(SqlRecipeStore::new(db_pool.clone()));
    let history: Arc<dyn HistoryStore> = Arc::new(SqlHistoryStore::new(db_pool.clone()));
    let checked_items: Arc<dyn CheckedItemsStore> =
        Arc::new(SqlShoppingListStore::new(db_pool.clone()));

    let selector = CandidateSelector::new(
        recipes.clone(),
        history.clone(),
        checked_items,
        config.planner.clone(),
    );
    let plans = Arc::new(PlanGenerator::new(
        selector,
        recipes.clone(),
        history.clone(),
        oracle.clone(),
    ));
    let alternatives =
        Arc::new(AlternativeGenerator::new(recipes, oracle, config.planner.clone()));

    let api_state =
        ApiState::new(plans, alternatives, history, config.planner.history_retention_days);

    Ok(Application { config, db_pool, api_state })
}
