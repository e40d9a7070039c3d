//! Request-scoped search and suggestion flows.
//!
//! [`SearchService`] runs each request as a straight sequence of remote
//! calls (embed, search, rehydrate, suggest). Search failures never
//! escape: callers get an empty result set with an error note instead.

pub mod prompt;
pub mod rank;
pub mod segment;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::clients::{ChatCompleter, Embedder, InputType};
use crate::config::Settings;
use crate::db::models::{CuisineCount, FeatureField, Features, GroupCount, Recipe, RecipeId};
use crate::store::{RecipeStore, TextQuery, VectorHit, VectorQuery};
use crate::{Error, Result};

use prompt::{ingredient_query, parse_ingredient_list, SuggestionCandidate};
use rank::order_by_rank;
use segment::split_suggestions;

/// Vector search size used to gather context for meal suggestions
pub const SUGGESTION_CONTEXT_LIMIT: usize = 10;

pub const NO_MATCHES_MESSAGE: &str = "No similar recipes found for the provided ingredients.";

/// Vector search match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: RecipeId,
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub features: Features,
    pub similarity_score: f32,
}

impl TryFrom<VectorHit> for SearchResult {
    type Error = Error;

    fn try_from(hit: VectorHit) -> Result<Self> {
        let id = hit
            .id
            .ok_or_else(|| Error::PartialFailure("search hit has no id".to_string()))?;
        let title = hit
            .title
            .ok_or_else(|| Error::PartialFailure(format!("search hit {id} has no title")))?;

        Ok(Self {
            id,
            title,
            ingredients: hit.ingredients.unwrap_or_default(),
            instructions: hit.instructions.unwrap_or_default(),
            features: hit.features.unwrap_or_default(),
            similarity_score: hit.score.unwrap_or(0.0),
        })
    }
}

/// Results of a fail-soft search; `error` is set when a backing service
/// failed and `results` is then empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome<T> {
    pub results: Vec<T>,
    pub error: Option<String>,
}

impl<T> SearchOutcome<T> {
    pub fn ok(results: Vec<T>) -> Self {
        Self {
            results,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionOutcome {
    Suggestions(Vec<String>),
    /// The search ran but nothing matched; not an error
    NoMatches,
    Failed(String),
}

impl SuggestionOutcome {
    pub fn suggestions(&self) -> &[String] {
        match self {
            SuggestionOutcome::Suggestions(s) => s,
            _ => &[],
        }
    }

    /// Message to show the user, if any
    pub fn error_message(&self) -> Option<String> {
        match self {
            SuggestionOutcome::Suggestions(_) => None,
            SuggestionOutcome::NoMatches => Some(NO_MATCHES_MESSAGE.to_string()),
            SuggestionOutcome::Failed(msg) => Some(msg.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub text_index: String,
    pub vector_index: String,
    pub vector_limit: usize,
    pub candidate_multiplier: usize,
    pub fuzzy_limit: usize,
    pub top_limit: usize,
    pub max_suggestions: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl SearchOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            text_index: settings.search.text_index_name.clone(),
            vector_index: settings.search.vector_index_name.clone(),
            vector_limit: settings.search.vector_limit,
            candidate_multiplier: settings.search.candidate_multiplier,
            fuzzy_limit: settings.search.fuzzy_limit,
            top_limit: settings.search.top_recipes_limit,
            max_suggestions: settings.suggestion.max_suggestions,
            max_tokens: settings.suggestion.max_tokens,
            temperature: settings.suggestion.temperature,
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            text_index: "default".to_string(),
            vector_index: "recipe_vector_index".to_string(),
            vector_limit: 10,
            candidate_multiplier: 3,
            fuzzy_limit: 50,
            top_limit: 20,
            max_suggestions: 4,
            max_tokens: 1500,
            temperature: 0.7,
        }
    }
}

pub struct SearchService {
    store: Arc<dyn RecipeStore>,
    embedder: Arc<dyn Embedder>,
    completer: Arc<dyn ChatCompleter>,
    options: SearchOptions,
}

impl SearchService {
    pub fn new(
        store: Arc<dyn RecipeStore>,
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn ChatCompleter>,
        options: SearchOptions,
    ) -> Self {
        Self {
            store,
            embedder,
            completer,
            options,
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<dyn RecipeStore> {
        &self.store
    }

    /// Semantic search on ingredient text
    pub async fn ingredient_search(&self, query: &str, limit: usize) -> SearchOutcome<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return SearchOutcome::ok(Vec::new());
        }

        self.vector_search(&ingredient_query(query), limit).await
    }

    async fn vector_search(&self, text: &str, limit: usize) -> SearchOutcome<SearchResult> {
        match self.try_vector_search(text, limit).await {
            Ok(results) => SearchOutcome::ok(results),
            Err(e) => {
                error!("Vector search failed: {}", e.log_safe());
                SearchOutcome::failed(e.log_safe())
            }
        }
    }

    async fn try_vector_search(&self, text: &str, limit: usize) -> Result<Vec<SearchResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(text, InputType::Query).await?;

        let query = VectorQuery::new(&self.options.vector_index, embedding, limit)
            .with_candidates(limit.saturating_mul(self.options.candidate_multiplier.max(1)));
        let hits = self.store.vector_search(&query).await?;

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            match SearchResult::try_from(hit) {
                Ok(result) => results.push(result),
                Err(e) => warn!("Skipping search hit: {}", e),
            }
        }
        results.truncate(limit);

        debug!("Vector search returned {} results", results.len());
        Ok(results)
    }

    /// Typo-tolerant lexical search, rehydrated in rank order
    pub async fn fuzzy_search(&self, query: &str) -> SearchOutcome<Recipe> {
        let query = query.trim();
        if query.is_empty() {
            return SearchOutcome::ok(Vec::new());
        }

        match self.try_fuzzy_search(query).await {
            Ok(recipes) => SearchOutcome::ok(recipes),
            Err(e) => {
                error!("Fuzzy search failed: {}", e.log_safe());
                SearchOutcome::failed(e.log_safe())
            }
        }
    }

    async fn try_fuzzy_search(&self, text: &str) -> Result<Vec<Recipe>> {
        let hits = self
            .store
            .fuzzy_search(&TextQuery {
                index: self.options.text_index.clone(),
                text: text.to_string(),
                limit: self.options.fuzzy_limit,
            })
            .await?;

        let ranked_ids: Vec<RecipeId> = hits.into_iter().map(|hit| hit.id).collect();
        let recipes = self.store.recipes_by_ids(&ranked_ids).await?;

        debug!(
            "Fuzzy search matched {} ids, rehydrated {}",
            ranked_ids.len(),
            recipes.len()
        );
        Ok(order_by_rank(recipes, &ranked_ids))
    }

    /// Meal ideas for a comma-separated ingredient list
    pub async fn meal_suggestions(&self, ingredients_text: &str) -> SuggestionOutcome {
        let ingredients = parse_ingredient_list(ingredients_text);
        if ingredients.is_empty() {
            return SuggestionOutcome::NoMatches;
        }

        let search_text = ingredient_query(&ingredients.join(", "));
        let outcome = self
            .vector_search(&search_text, SUGGESTION_CONTEXT_LIMIT)
            .await;

        if let Some(err) = outcome.error {
            return SuggestionOutcome::Failed(format!("An error occurred: {err}"));
        }
        if outcome.results.is_empty() {
            info!("No similar recipes for {} ingredients", ingredients.len());
            return SuggestionOutcome::NoMatches;
        }

        let candidates: Vec<SuggestionCandidate> =
            outcome.results.iter().map(SuggestionCandidate::from).collect();

        match self.suggest(&ingredients, &candidates).await {
            Ok(suggestions) => SuggestionOutcome::Suggestions(suggestions),
            Err(e) => {
                error!("Meal suggestion failed: {}", e.log_safe());
                SuggestionOutcome::Failed(format!("An error occurred: {}", e.log_safe()))
            }
        }
    }

    async fn suggest(
        &self,
        ingredients: &[String],
        candidates: &[SuggestionCandidate],
    ) -> Result<Vec<String>> {
        let request = prompt::build_request(
            ingredients,
            candidates,
            self.options.max_suggestions,
            self.options.max_tokens,
            self.options.temperature,
        )?;

        let text = self.completer.complete(&request).await?;
        Ok(split_suggestions(&text, self.options.max_suggestions))
    }

    /// Recipe counts per cuisine, most common first
    pub async fn cuisine_statistics(&self) -> SearchOutcome<CuisineCount> {
        match self
            .store
            .count_by_feature(&GroupCount::new(FeatureField::Cuisine))
            .await
        {
            Ok(stats) => SearchOutcome::ok(stats),
            Err(e) => {
                error!("Cuisine statistics failed: {}", e.log_safe());
                SearchOutcome::failed(e.log_safe())
            }
        }
    }

    /// Look up a recipe by its string id
    pub async fn recipe_detail(&self, raw_id: &str) -> Result<Recipe> {
        let id = RecipeId::parse(raw_id)?;
        self.store.get_recipe(&id).await
    }

    /// First recipes by title
    pub async fn top_recipes(&self) -> Result<Vec<Recipe>> {
        self.store.list_recipes(self.options.top_limit).await
    }
}
