// Full-text indexing for fuzzy recipe search

pub mod schema;
pub mod search;

// Re-exports
pub use schema::RecipeSchema;
pub use search::{SearchIndex, SearchResult};
