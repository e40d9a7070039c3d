use tantivy::schema::{Field, Schema, STORED, STRING, TEXT};

/// Schema for the recipe full-text index
#[derive(Clone)]
pub struct RecipeSchema {
    pub schema: Schema,
    pub id: Field,
    pub title: Field,
    pub ingredients: Field,
    pub instructions: Field,
}

impl RecipeSchema {
    pub fn new() -> Self {
        let mut schema_builder = Schema::builder();

        // Document id (exact match only, used for deletes and rehydration)
        let id = schema_builder.add_text_field("id", STRING | STORED);

        let title = schema_builder.add_text_field("title", TEXT);

        // One value per ingredient line
        let ingredients = schema_builder.add_text_field("ingredients", TEXT);

        let instructions = schema_builder.add_text_field("instructions", TEXT);

        let schema = schema_builder.build();

        Self {
            schema,
            id,
            title,
            ingredients,
            instructions,
        }
    }
}

impl Default for RecipeSchema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creation() {
        let schema = RecipeSchema::new();
        assert!(schema.schema.get_field("id").is_ok());
        assert!(schema.schema.get_field("title").is_ok());
        assert!(schema.schema.get_field("ingredients").is_ok());
        assert!(schema.schema.get_field("instructions").is_ok());
    }
}
