use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;

use crate::error::{Error, Result};

/// Opaque document identifier: 12 bytes rendered as 24 lowercase hex digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(String);

impl RecipeId {
    pub const LEN: usize = 24;

    /// Parse a caller-supplied identifier. Malformed input is rejected here,
    /// before any query reaches the store.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.len() != Self::LEN || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidArgument(format!(
                "Invalid recipe ID format: {raw}"
            )));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// New id: 4-byte big-endian unix timestamp followed by 8 random bytes
    pub fn generate() -> Self {
        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let random = uuid::Uuid::new_v4();

        let mut id = String::with_capacity(Self::LEN);
        for byte in seconds
            .to_be_bytes()
            .iter()
            .chain(random.as_bytes()[..8].iter())
        {
            id.push_str(&format!("{byte:02x}"));
        }
        Self(id)
    }

    /// Wrap an id read back from storage or the text index
    pub(crate) fn from_stored(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Nested recipe features; every field falls back to a default when absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Features {
    #[serde(default)]
    pub preparation_time: String,
    #[serde(default)]
    pub complexity: String,
    #[serde(default)]
    pub prep_time: i64,
    #[serde(default)]
    pub cuisine: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub instructions: String,
    pub ingredients: Vec<String>,
    pub embedding_ingredients: Option<String>,
    pub features: Option<Features>,
    #[serde(skip_serializing)]
    pub voyage_embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    pub fn has_embedding(&self) -> bool {
        self.voyage_embedding.is_some()
    }

    /// Text submitted when computing the document embedding
    pub fn embedding_source(&self) -> String {
        format!(
            "{}. Ingredients: {}",
            self.title,
            self.embedding_ingredients.as_deref().unwrap_or_default()
        )
    }
}

/// Raw row shape; JSON columns are decoded here
#[derive(Debug, FromRow)]
pub(crate) struct RecipeRow {
    pub id: String,
    pub title: String,
    pub instructions: String,
    pub ingredients: Json<Vec<String>>,
    pub embedding_ingredients: Option<String>,
    pub features: Option<Json<Features>>,
    pub voyage_embedding: Option<Json<Vec<f32>>>,
    pub created_at: DateTime<Utc>,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Recipe {
            id: RecipeId(row.id),
            title: row.title,
            instructions: row.instructions,
            ingredients: row.ingredients.0,
            embedding_ingredients: row.embedding_ingredients,
            features: row.features.map(|f| f.0),
            voyage_embedding: row.voyage_embedding.map(|v| v.0),
            created_at: row.created_at,
        }
    }
}

/// Import record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub embedding_ingredients: Option<String>,
    #[serde(default)]
    pub features: Option<Features>,
}

/// Nested feature fields that can be grouped on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureField {
    Cuisine,
    Complexity,
    PreparationTime,
}

impl FeatureField {
    pub fn json_path(self) -> &'static str {
        match self {
            FeatureField::Cuisine => "$.cuisine",
            FeatureField::Complexity => "$.complexity",
            FeatureField::PreparationTime => "$.preparation_time",
        }
    }
}

/// Declarative group-and-count: project a feature field, group on it,
/// count members, sort by count descending, label missing keys
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCount {
    pub field: FeatureField,
    pub missing_label: String,
}

impl GroupCount {
    pub const UNSPECIFIED: &'static str = "Unspecified";

    pub fn new(field: FeatureField) -> Self {
        Self {
            field,
            missing_label: Self::UNSPECIFIED.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CuisineCount {
    pub cuisine: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_object_id_format() {
        let id = RecipeId::parse("65F1A2B3C4D5E6F708192A3B").unwrap();
        assert_eq!(id.as_str(), "65f1a2b3c4d5e6f708192a3b");
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        for raw in ["", "123", "zzzzzzzzzzzzzzzzzzzzzzzz", "65f1a2b3c4d5e6f708192a3b00"] {
            assert!(
                matches!(RecipeId::parse(raw), Err(Error::InvalidArgument(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_generated_ids_round_trip_through_parse() {
        let id = RecipeId::generate();
        assert_eq!(id.as_str().len(), RecipeId::LEN);
        assert_eq!(RecipeId::parse(id.as_str()).unwrap(), id);
        assert_ne!(RecipeId::generate(), id);
    }

    #[test]
    fn test_new_recipe_defaults_missing_fields() {
        let recipe: NewRecipe = serde_json::from_str(r#"{"title": "Toast"}"#).unwrap();
        assert_eq!(recipe.title, "Toast");
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.features.is_none());

        let features: Features = serde_json::from_str(r#"{"complexity": "easy"}"#).unwrap();
        assert_eq!(features.prep_time, 0);
        assert_eq!(features.cuisine, None);
    }

    #[test]
    fn test_embedding_source_combines_title_and_ingredients() {
        let recipe = Recipe {
            id: RecipeId::generate(),
            title: "Pesto".to_string(),
            instructions: String::new(),
            ingredients: vec![],
            embedding_ingredients: Some("basil, pine nuts".to_string()),
            features: None,
            voyage_embedding: None,
            created_at: Utc::now(),
        };
        assert_eq!(recipe.embedding_source(), "Pesto. Ingredients: basil, pine nuts");
    }
}
