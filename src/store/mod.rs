//! Document store access used by the search service.
//!
//! [`RecipeStore`] is the seam between request handling and storage. The
//! bundled [`LocalStore`] keeps documents in SQLite, answers fuzzy queries
//! from a tantivy index and ranks embeddings by cosine similarity.

pub mod local;
pub mod vector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::models::{CuisineCount, Features, GroupCount, NewRecipe, Recipe, RecipeId};
use crate::Result;

pub use local::LocalStore;

/// Document field holding recipe embeddings
pub const EMBEDDING_PATH: &str = "voyage_embedding";

/// Default candidate pool as a multiple of the result limit
pub const DEFAULT_CANDIDATE_MULTIPLIER: usize = 3;

/// Nearest-neighbour query against a named vector index
#[derive(Debug, Clone, PartialEq)]
pub struct VectorQuery {
    pub index: String,
    pub path: String,
    pub vector: Vec<f32>,
    pub limit: usize,
    /// Candidates scanned before truncating to `limit`
    pub num_candidates: usize,
}

impl VectorQuery {
    pub fn new(index: impl Into<String>, vector: Vec<f32>, limit: usize) -> Self {
        Self {
            index: index.into(),
            path: EMBEDDING_PATH.to_string(),
            vector,
            limit,
            num_candidates: limit * DEFAULT_CANDIDATE_MULTIPLIER,
        }
    }

    pub fn with_candidates(mut self, num_candidates: usize) -> Self {
        self.num_candidates = num_candidates;
        self
    }
}

/// One vector match as projected by the store. Every field is optional;
/// consumers decide which ones they require.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    #[serde(default)]
    pub id: Option<RecipeId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub features: Option<Features>,
    #[serde(default)]
    pub score: Option<f32>,
}

impl VectorHit {
    pub fn from_recipe(recipe: Recipe, score: f32) -> Self {
        Self {
            id: Some(recipe.id),
            title: Some(recipe.title),
            ingredients: Some(recipe.ingredients),
            instructions: Some(recipe.instructions),
            features: recipe.features,
            score: Some(score),
        }
    }
}

/// Fuzzy full-text query against a named text index
#[derive(Debug, Clone, PartialEq)]
pub struct TextQuery {
    pub index: String,
    pub text: String,
    pub limit: usize,
}

/// Text-relevance match; scores are not comparable with vector scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextHit {
    pub id: RecipeId,
    pub score: f32,
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Point lookup; `NotFound` when absent
    async fn get_recipe(&self, id: &RecipeId) -> Result<Recipe>;

    /// Recipes ordered by title
    async fn list_recipes(&self, limit: usize) -> Result<Vec<Recipe>>;

    /// Bulk lookup. The returned order is unspecified.
    async fn recipes_by_ids(&self, ids: &[RecipeId]) -> Result<Vec<Recipe>>;

    /// Group-and-count aggregation over a features field
    async fn count_by_feature(&self, group: &GroupCount) -> Result<Vec<CuisineCount>>;

    /// Up to `limit` hits ordered by descending similarity
    async fn vector_search(&self, query: &VectorQuery) -> Result<Vec<VectorHit>>;

    /// Up to `limit` hits ordered by descending text relevance
    async fn fuzzy_search(&self, query: &TextQuery) -> Result<Vec<TextHit>>;

    async fn insert_recipe(&self, recipe: &NewRecipe) -> Result<RecipeId>;

    async fn recipes_missing_embedding(&self) -> Result<Vec<Recipe>>;

    /// Store an embedding for a recipe that has none.
    /// Returns false if one was already present.
    async fn store_embedding(&self, id: &RecipeId, embedding: &[f32]) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_query_defaults_to_triple_candidates() {
        let query = VectorQuery::new("recipe_vector_index", vec![0.1], 10);
        assert_eq!(query.num_candidates, 30);
        assert_eq!(query.path, EMBEDDING_PATH);
        assert_eq!(query.with_candidates(100).num_candidates, 100);
    }

    #[test]
    fn test_vector_hit_tolerates_missing_fields() {
        let hit: VectorHit = serde_json::from_str(r#"{"title": "Stew"}"#).unwrap();
        assert_eq!(hit.title.as_deref(), Some("Stew"));
        assert!(hit.id.is_none());
        assert!(hit.score.is_none());
    }
}
