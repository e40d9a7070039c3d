use serde::{Deserialize, Serialize};

use crate::clients::ChatRequest;
use crate::db::models::RecipeId;
use crate::orchestrator::SearchResult;
use crate::Result;

pub const SYSTEM_PROMPT: &str = "You are a helpful cooking assistant that provides meal suggestions based on available ingredients.";

/// Recipe context handed to the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionCandidate {
    pub title: String,
    pub ingredients: Vec<String>,
    pub score: f32,
    pub id: RecipeId,
}

impl From<&SearchResult> for SuggestionCandidate {
    fn from(result: &SearchResult) -> Self {
        Self {
            title: result.title.clone(),
            ingredients: result.ingredients.clone(),
            score: result.similarity_score,
            id: result.id.clone(),
        }
    }
}

/// Split comma-separated user input into trimmed, non-empty ingredients
pub fn parse_ingredient_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Text embedded for ingredient searches
pub fn ingredient_query(ingredients: &str) -> String {
    format!("Ingredients: {ingredients}")
}

pub fn build_user_prompt(
    ingredients: &[String],
    candidates: &[SuggestionCandidate],
    max_suggestions: usize,
) -> Result<String> {
    let context = serde_json::to_string_pretty(candidates)?;

    Ok(format!(
        "I have these ingredients: {ingredients}\n\
         \n\
         Based on these ingredients, I need {max_suggestions} meal suggestions.\n\
         Here are some similar recipes from my database that might help you:\n\
         \n\
         {context}\n\
         \n\
         For each suggestion, please:\n\
         1. Provide a recipe name\n\
         2. List the ingredients I have that can be used\n\
         3. Suggest substitutions for any missing ingredients\n\
         4. Give a brief description of how to prepare it\n\
         5. Mention difficulty level (easy, medium, hard)\n\
         \n\
         Be friendly, practical, and focus on using what I have available with minimal extra ingredients.\n\
         Keep your answer concise and focused on the meal suggestions.\n",
        ingredients = ingredients.join(", "),
    ))
}

pub fn build_request(
    ingredients: &[String],
    candidates: &[SuggestionCandidate],
    max_suggestions: usize,
    max_tokens: u32,
    temperature: f32,
) -> Result<ChatRequest> {
    Ok(ChatRequest {
        system: SYSTEM_PROMPT.to_string(),
        user: build_user_prompt(ingredients, candidates, max_suggestions)?,
        max_tokens,
        temperature,
    })
}
