//! Weekly-plan JSON API.
//!
//! Endpoints:
//! - `POST /api/weekly-plan`              — generate a weekly plan
//! - `POST /api/weekly-plan/alternatives` — replacements for a rejected recipe
//! - `POST /api/weekly-plan/history`      — record accept/reject/suggest
//! - `POST /api/weekly-plan/reset`        — wipe a user's planning history
//! - `GET  /api/weekly-plan/history`      — list recipes used in past plans

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use mealweek_core::planner::{AlternativeGenerator, PlanGenerator};
use mealweek_core::{
    AlternativeRecipe, DecisionStatus, HistoryStore, PlannerError, RecipeId, UsedRecipe, UserId,
    WeeklyPlan,
};

#[derive(Clone)]
pub struct ApiState {
    plans: Arc<PlanGenerator>,
    alternatives: Arc<AlternativeGenerator>,
    history: Arc<dyn HistoryStore>,
    retention_days: u32,
}

impl ApiState {
    pub fn new(
        plans: Arc<PlanGenerator>,
        alternatives: Arc<AlternativeGenerator>,
        history: Arc<dyn HistoryStore>,
        retention_days: u32,
    ) -> Self {
        Self { plans, alternatives, history, retention_days }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/weekly-plan", post(generate_plan))
        .route("/api/weekly-plan/alternatives", post(generate_alternatives))
        .route("/api/weekly-plan/history", post(record_decision).get(list_history))
        .route("/api/weekly-plan/reset", post(reset_history))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativesRequest {
    pub user_id: i64,
    pub rejected_recipe_id: i64,
    #[serde(default)]
    pub current_weekly_plan: Vec<PlanEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PlanEntry {
    pub id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativesResponse {
    pub alternatives: Vec<AlternativeRecipe>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDecisionRequest {
    pub user_id: i64,
    pub recipe_id: i64,
    pub status: DecisionStatus,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub deleted_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub used_recipes: Vec<UsedRecipeDto>,
    pub total_used: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedRecipeDto {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    pub url: String,
    pub status: DecisionStatus,
    pub plan_date: DateTime<Utc>,
}

impl From<UsedRecipe> for UsedRecipeDto {
    fn from(used: UsedRecipe) -> Self {
        Self {
            id: used.id.0,
            title: used.title,
            image: used.image,
            url: used.url,
            status: used.status,
            plan_date: used.plan_date,
        }
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub timeout: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<bool>,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into(), timeout: false }
    }
}

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        let status = match &err {
            PlannerError::NoRecipes => StatusCode::NOT_FOUND,
            PlannerError::NoAlternatives => StatusCode::BAD_REQUEST,
            PlannerError::RequestTimeout => StatusCode::GATEWAY_TIMEOUT,
            PlannerError::OracleTimeout | PlannerError::OracleTransport(_) => {
                StatusCode::BAD_GATEWAY
            }
            PlannerError::Parse(_)
            | PlannerError::NotFound(_)
            | PlannerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.user_message().to_string(),
            timeout: matches!(err, PlannerError::RequestTimeout),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.message, timeout: self.timeout.then_some(true) };
        (self.status, Json(body)).into_response()
    }
}

/// Opportunistic history cleanup triggered by plan requests. Runs off the
/// request path; failures are logged and swallowed.
async fn retention_sweep(history: Arc<dyn HistoryStore>, retention_days: u32) {
    let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
    match history.purge_older_than(cutoff).await {
        Ok(purged) if purged > 0 => {
            info!(
                event_name = "api.retention.purged",
                purged_records = purged,
                "purged expired weekly-plan history"
            );
        }
        Ok(_) => {}
        Err(error) => {
            warn!(
                event_name = "api.retention.failed",
                error = %error,
                "retention sweep failed"
            );
        }
    }
}

fn parse_user(user_id: i64) -> Result<UserId, ApiError> {
    if user_id <= 0 {
        return Err(ApiError::bad_request("userId must be a positive integer"));
    }
    Ok(UserId(user_id))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn generate_plan(
    State(state): State<ApiState>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<WeeklyPlan>, ApiError> {
    let correlation_id = Uuid::new_v4();
    let user = parse_user(request.user_id)?;

    info!(
        event_name = "api.weekly_plan.requested",
        correlation_id = %correlation_id,
        user_id = user.0,
        "weekly plan requested"
    );

    // Detached so purge latency never delays the plan.
    tokio::spawn(retention_sweep(state.history.clone(), state.retention_days));

    let plan = state.plans.generate(user).await.map_err(|err| {
        warn!(
            event_name = "api.weekly_plan.failed",
            correlation_id = %correlation_id,
            user_id = user.0,
            error = %err,
            "weekly plan generation failed"
        );
        ApiError::from(err)
    })?;

    info!(
        event_name = "api.weekly_plan.completed",
        correlation_id = %correlation_id,
        user_id = user.0,
        recipe_count = plan.recipes.len(),
        fallback_used = plan.fallback_used,
        "weekly plan generated"
    );

    Ok(Json(plan))
}

pub async fn generate_alternatives(
    State(state): State<ApiState>,
    Json(request): Json<AlternativesRequest>,
) -> Result<Json<AlternativesResponse>, ApiError> {
    let correlation_id = Uuid::new_v4();
    let user = parse_user(request.user_id)?;
    if request.rejected_recipe_id <= 0 {
        return Err(ApiError::bad_request("rejectedRecipeId must be a positive integer"));
    }

    let rejected = RecipeId(request.rejected_recipe_id);
    let current_plan: Vec<RecipeId> =
        request.current_weekly_plan.iter().map(|entry| RecipeId(entry.id)).collect();

    info!(
        event_name = "api.alternatives.requested",
        correlation_id = %correlation_id,
        user_id = user.0,
        rejected_recipe_id = rejected.0,
        "alternatives requested"
    );

    let alternatives =
        state.alternatives.generate(user, rejected, &current_plan).await.map_err(|err| {
            warn!(
                event_name = "api.alternatives.failed",
                correlation_id = %correlation_id,
                user_id = user.0,
                rejected_recipe_id = rejected.0,
                error = %err,
                "alternatives generation failed"
            );
            ApiError::from(err)
        })?;

    Ok(Json(AlternativesResponse { alternatives, generated_at: Utc::now() }))
}

pub async fn record_decision(
    State(state): State<ApiState>,
    Json(request): Json<RecordDecisionRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    let correlation_id = Uuid::new_v4();
    let user = parse_user(request.user_id)?;
    if request.recipe_id <= 0 {
        return Err(ApiError::bad_request("recipeId must be a positive integer"));
    }

    state
        .history
        .record_decision(user, RecipeId(request.recipe_id), request.status, Utc::now())
        .await
        .map_err(|err| ApiError::from(PlannerError::from(err)))?;

    info!(
        event_name = "api.history.recorded",
        correlation_id = %correlation_id,
        user_id = user.0,
        recipe_id = request.recipe_id,
        status = %request.status,
        "planning decision recorded"
    );

    Ok(Json(AckResponse { success: true }))
}

pub async fn reset_history(
    State(state): State<ApiState>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<ResetResponse>, ApiError> {
    let correlation_id = Uuid::new_v4();
    let user = parse_user(request.user_id)?;

    let deleted_count = state
        .history
        .reset_for_user(user)
        .await
        .map_err(|err| ApiError::from(PlannerError::from(err)))?;

    info!(
        event_name = "api.history.reset",
        correlation_id = %correlation_id,
        user_id = user.0,
        deleted_count,
        "planning history reset"
    );

    Ok(Json(ResetResponse { deleted_count }))
}

pub async fn list_history(
    State(state): State<ApiState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let user = parse_user(query.user_id)?;

    let used_recipes: Vec<UsedRecipeDto> = state
        .history
        .list_used_recipes(user)
        .await
        .map_err(|err| ApiError::from(PlannerError::from(err)))?
        .into_iter()
        .map(UsedRecipeDto::from)
        .collect();

    let total_used = used_recipes.len();
    Ok(Json(HistoryResponse { used_recipes, total_used }))
}
