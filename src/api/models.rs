use serde::{Deserialize, Serialize};

use crate::db::models::{CuisineCount, Recipe};
use crate::orchestrator::SearchResult;

/// GET /ingredient-search parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientSearchParams {
    #[serde(default)]
    pub query: String,
}

/// GET /fuzzy-search parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FuzzySearchParams {
    #[serde(default)]
    pub q: String,
}

/// GET /ai-suggestions parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionParams {
    /// Comma-separated ingredient list
    #[serde(default)]
    pub ingredients: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipesResponse {
    pub recipes: Vec<Recipe>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub cuisine_stats: Vec<CuisineCount>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientSearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzySearchResponse {
    pub query: String,
    pub recipes: Vec<Recipe>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub ingredients: String,
    pub suggestions: Vec<String>,
    pub error_message: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub store: String,
}
