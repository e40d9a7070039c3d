//! In-memory stand-ins for the remote services, shared by unit tests.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use crate::clients::{ChatCompleter, ChatRequest, Embedder, InputType};
use crate::db::models::{CuisineCount, GroupCount, NewRecipe, Recipe, RecipeId};
use crate::store::{RecipeStore, TextHit, TextQuery, VectorHit, VectorQuery};
use crate::{Error, Result};

pub fn recipe_id(n: u8) -> RecipeId {
    RecipeId::parse(&format!("{n:024x}")).unwrap()
}

pub fn recipe(n: u8, title: &str) -> Recipe {
    Recipe {
        id: recipe_id(n),
        title: title.to_string(),
        instructions: format!("Make {title}."),
        ingredients: vec!["salt".to_string()],
        embedding_ingredients: Some("salt".to_string()),
        features: None,
        voyage_embedding: None,
        created_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub recipes: Vec<Recipe>,
    pub vector_hits: Vec<VectorHit>,
    pub text_hits: Vec<TextHit>,
    pub stats: Vec<CuisineCount>,
    pub fail: bool,
    pub vector_queries: Mutex<Vec<VectorQuery>>,
    pub text_queries: Mutex<Vec<TextQuery>>,
    pub lookups: Mutex<usize>,
}

impl FakeStore {
    fn check(&self) -> Result<()> {
        if self.fail {
            Err(Error::Search("store unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    pub fn vector_queries(&self) -> Vec<VectorQuery> {
        self.vector_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecipeStore for FakeStore {
    async fn get_recipe(&self, id: &RecipeId) -> Result<Recipe> {
        self.check()?;
        *self.lookups.lock().unwrap() += 1;
        self.recipes
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Recipe {id} not found")))
    }

    async fn list_recipes(&self, limit: usize) -> Result<Vec<Recipe>> {
        self.check()?;
        let mut recipes = self.recipes.clone();
        recipes.sort_by(|a, b| a.title.cmp(&b.title));
        recipes.truncate(limit);
        Ok(recipes)
    }

    async fn recipes_by_ids(&self, ids: &[RecipeId]) -> Result<Vec<Recipe>> {
        self.check()?;
        // Reverse storage order to prove callers do not rely on it
        Ok(self
            .recipes
            .iter()
            .rev()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn count_by_feature(&self, _group: &GroupCount) -> Result<Vec<CuisineCount>> {
        self.check()?;
        Ok(self.stats.clone())
    }

    async fn vector_search(&self, query: &VectorQuery) -> Result<Vec<VectorHit>> {
        self.vector_queries.lock().unwrap().push(query.clone());
        self.check()?;
        Ok(self.vector_hits.iter().take(query.limit).cloned().collect())
    }

    async fn fuzzy_search(&self, query: &TextQuery) -> Result<Vec<TextHit>> {
        self.text_queries.lock().unwrap().push(query.clone());
        self.check()?;
        Ok(self.text_hits.iter().take(query.limit).cloned().collect())
    }

    async fn insert_recipe(&self, _recipe: &NewRecipe) -> Result<RecipeId> {
        self.check()?;
        Ok(RecipeId::generate())
    }

    async fn recipes_missing_embedding(&self) -> Result<Vec<Recipe>> {
        self.check()?;
        Ok(self
            .recipes
            .iter()
            .filter(|r| !r.has_embedding())
            .cloned()
            .collect())
    }

    async fn store_embedding(&self, _id: &RecipeId, _embedding: &[f32]) -> Result<bool> {
        self.check()?;
        Ok(true)
    }
}

/// Embedder returning a fixed vector, or failing for texts it is told to
#[derive(Default)]
pub struct FakeEmbedder {
    pub vector: Vec<f32>,
    pub fail_on: Option<String>,
    pub fail_all: bool,
    pub calls: Mutex<Vec<(String, InputType)>>,
}

impl FakeEmbedder {
    pub fn returning(vector: Vec<f32>) -> Self {
        Self {
            vector,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, InputType)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str, input_type: InputType) -> Result<Vec<f32>> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), input_type));

        if self.fail_all || self.fail_on.as_deref().is_some_and(|t| text.contains(t)) {
            return Err(Error::Service("embedding API returned 503".to_string()));
        }
        Ok(self.vector.clone())
    }
}

#[derive(Default)]
pub struct FakeCompleter {
    pub response: String,
    pub fail: bool,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl FakeCompleter {
    pub fn replying(response: &str) -> Self {
        Self {
            response: response.to_string(),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompleter for FakeCompleter {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(Error::Service("Language model API error: 529".to_string()));
        }
        Ok(self.response.clone())
    }
}
