use crate::db::{models::*, DbPool};
use crate::error::{Error, Result};
use chrono::Utc;
use sqlx::types::Json;

/// Insert a new recipe document
pub async fn create_recipe(pool: &DbPool, new_recipe: &NewRecipe) -> Result<Recipe> {
    let id = RecipeId::generate();

    let row = sqlx::query_as::<_, RecipeRow>(
        r#"
        INSERT INTO recipes (
            id, title, instructions, ingredients, embedding_ingredients,
            features, voyage_embedding, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, NULL, ?)
        RETURNING *
        "#,
    )
    .bind(id.as_str())
    .bind(&new_recipe.title)
    .bind(&new_recipe.instructions)
    .bind(Json(&new_recipe.ingredients))
    .bind(&new_recipe.embedding_ingredients)
    .bind(new_recipe.features.as_ref().map(Json))
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Get recipe by ID
pub async fn get_recipe(pool: &DbPool, recipe_id: &RecipeId) -> Result<Recipe> {
    let row = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE id = ?")
        .bind(recipe_id.as_str())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Recipe {recipe_id} not found")))?;

    Ok(row.into())
}

/// Fetch every listed recipe that exists. Row order is whatever SQLite
/// returns; callers needing a ranking must reorder.
pub async fn get_recipes_by_ids(pool: &DbPool, recipe_ids: &[RecipeId]) -> Result<Vec<Recipe>> {
    if recipe_ids.is_empty() {
        return Ok(Vec::new());
    }

    // Build query with IN clause
    let placeholders = recipe_ids
        .iter()
        .enumerate()
        .map(|(i, _)| format!("?{}", i + 1))
        .collect::<Vec<_>>()
        .join(",");

    let query_str = format!("SELECT * FROM recipes WHERE id IN ({placeholders})");

    let mut query = sqlx::query_as::<_, RecipeRow>(&query_str);
    for id in recipe_ids {
        query = query.bind(id.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows.into_iter().map(Recipe::from).collect())
}

/// List recipes ordered by title
pub async fn list_by_title(pool: &DbPool, limit: i64) -> Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, RecipeRow>(
        "SELECT * FROM recipes ORDER BY title ASC, id ASC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Recipe::from).collect())
}

/// List every recipe (used when rebuilding the text index)
pub async fn list_all(pool: &DbPool) -> Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Recipe::from).collect())
}

/// Count all recipes
pub async fn count_all_recipes(pool: &DbPool) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

/// Recipes that still lack an embedding
pub async fn list_missing_embedding(pool: &DbPool) -> Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, RecipeRow>(
        "SELECT * FROM recipes WHERE voyage_embedding IS NULL ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Recipe::from).collect())
}

/// Store an embedding unless one is already present.
/// Returns whether the row was updated.
pub async fn set_embedding_if_missing(
    pool: &DbPool,
    recipe_id: &RecipeId,
    embedding: &[f32],
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE recipes SET voyage_embedding = ? WHERE id = ? AND voyage_embedding IS NULL",
    )
    .bind(Json(embedding))
    .bind(recipe_id.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Ids and embeddings of every embedded recipe
pub async fn list_embeddings(pool: &DbPool) -> Result<Vec<(RecipeId, Vec<f32>)>> {
    let rows: Vec<(String, Json<Vec<f32>>)> = sqlx::query_as(
        "SELECT id, voyage_embedding FROM recipes WHERE voyage_embedding IS NOT NULL",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, embedding)| (RecipeId::from_stored(id), embedding.0))
        .collect())
}

/// Group recipes on a feature field and count them, most frequent first.
/// Missing or null keys are grouped together under `missing_label`.
pub async fn count_by_feature(pool: &DbPool, group: &GroupCount) -> Result<Vec<CuisineCount>> {
    let query_str = format!(
        r#"
        SELECT COALESCE(label, ?) AS cuisine, count
        FROM (
            SELECT json_extract(features, '{path}') AS label, COUNT(*) AS count
            FROM recipes
            GROUP BY label
        )
        ORDER BY count DESC, label IS NULL, label ASC
        "#,
        path = group.field.json_path()
    );

    let stats = sqlx::query_as::<_, CuisineCount>(&query_str)
        .bind(&group.missing_label)
        .fetch_all(pool)
        .await?;

    Ok(stats)
}
