use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::api::models::*;
use crate::db::models::Recipe;
use crate::orchestrator::SearchService;
use crate::Result;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
}

/// GET / - Service banner
pub async fn index() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Recipes App".to_string(),
    })
}

/// GET /top - First recipes by title
pub async fn top_recipes(State(state): State<AppState>) -> Result<Json<RecipesResponse>> {
    debug!("Top recipes request");

    let recipes = state.service.top_recipes().await?;
    Ok(Json(RecipesResponse { recipes }))
}

/// GET /recipe/:id - Recipe details
pub async fn recipe_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>> {
    debug!("Get recipe request: {}", id);

    let recipe = state.service.recipe_detail(&id).await?;
    Ok(Json(recipe))
}

/// GET /stats - Recipe counts per cuisine
pub async fn statistics(State(state): State<AppState>) -> Json<StatsResponse> {
    debug!("Stats request");

    let outcome = state.service.cuisine_statistics().await;
    Json(StatsResponse {
        cuisine_stats: outcome.results,
        error: outcome.error,
    })
}

/// GET /ingredient-search - Semantic search on ingredients
pub async fn ingredient_search(
    State(state): State<AppState>,
    Query(params): Query<IngredientSearchParams>,
) -> Json<IngredientSearchResponse> {
    debug!("Ingredient search request: {:?}", params);

    let limit = state.service.options().vector_limit;
    let outcome = state.service.ingredient_search(&params.query, limit).await;

    Json(IngredientSearchResponse {
        query: params.query,
        results: outcome.results,
        error: outcome.error,
    })
}

/// GET /fuzzy-search - Typo-tolerant text search
pub async fn fuzzy_search(
    State(state): State<AppState>,
    Query(params): Query<FuzzySearchParams>,
) -> Json<FuzzySearchResponse> {
    debug!("Fuzzy search request: {:?}", params);

    let outcome = state.service.fuzzy_search(&params.q).await;

    Json(FuzzySearchResponse {
        query: params.q,
        recipes: outcome.results,
        error: outcome.error,
    })
}

/// GET /ai-suggestions - Meal ideas for the given ingredients
pub async fn ai_suggestions(
    State(state): State<AppState>,
    Query(params): Query<SuggestionParams>,
) -> Json<SuggestionResponse> {
    debug!("Suggestion request: {:?}", params);

    // No ingredients yet: nothing to suggest, and nothing went wrong
    if params.ingredients.trim().is_empty() {
        return Json(SuggestionResponse {
            ingredients: params.ingredients,
            suggestions: Vec::new(),
            error_message: None,
        });
    }

    let outcome = state.service.meal_suggestions(&params.ingredients).await;

    Json(SuggestionResponse {
        suggestions: outcome.suggestions().to_vec(),
        error_message: outcome.error_message(),
        ingredients: params.ingredients,
    })
}

/// GET /health - Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /ready - Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let store_healthy = state.service.store().list_recipes(1).await.is_ok();

    Json(ReadinessResponse {
        ready: store_healthy,
        store: if store_healthy { "ok" } else { "error" }.to_string(),
    })
}
