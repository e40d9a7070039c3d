use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::db::models::{CuisineCount, GroupCount, NewRecipe, Recipe, RecipeId};
use crate::db::{self, DbPool};
use crate::indexer::SearchIndex;
use crate::store::vector::top_candidates;
use crate::store::{RecipeStore, TextHit, TextQuery, VectorHit, VectorQuery, EMBEDDING_PATH};
use crate::{Error, Result};

/// Self-hosted document store: SQLite documents plus a tantivy text index
pub struct LocalStore {
    pool: DbPool,
    text_index: SearchIndex,
    text_index_name: String,
    vector_index_name: String,
    /// Serializes index writers; tantivy allows one per index
    writer_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(
        pool: DbPool,
        text_index: SearchIndex,
        text_index_name: impl Into<String>,
        vector_index_name: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            text_index,
            text_index_name: text_index_name.into(),
            vector_index_name: vector_index_name.into(),
            writer_lock: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Re-create the text index from the stored documents
    pub async fn rebuild_text_index(&self) -> Result<usize> {
        let recipes = db::recipes::list_all(&self.pool).await?;

        let _guard = self.writer_lock.lock().await;
        let mut writer = self.text_index.writer()?;
        self.text_index.clear(&mut writer)?;
        for recipe in &recipes {
            self.text_index.index_recipe(&mut writer, recipe)?;
        }
        self.text_index.commit(&mut writer)?;

        info!("Rebuilt text index with {} recipes", recipes.len());
        Ok(recipes.len())
    }

    fn check_vector_query(&self, query: &VectorQuery) -> Result<()> {
        if query.index != self.vector_index_name {
            return Err(Error::InvalidArgument(format!(
                "Unknown vector index: {}",
                query.index
            )));
        }
        if query.path != EMBEDDING_PATH {
            return Err(Error::InvalidArgument(format!(
                "Field {} is not covered by index {}",
                query.path, query.index
            )));
        }
        if query.limit == 0 {
            return Err(Error::InvalidArgument(
                "Vector search limit must be positive".to_string(),
            ));
        }
        if query.num_candidates < query.limit {
            return Err(Error::InvalidArgument(format!(
                "numCandidates ({}) must be at least the limit ({})",
                query.num_candidates, query.limit
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeStore for LocalStore {
    async fn get_recipe(&self, id: &RecipeId) -> Result<Recipe> {
        db::recipes::get_recipe(&self.pool, id).await
    }

    async fn list_recipes(&self, limit: usize) -> Result<Vec<Recipe>> {
        db::recipes::list_by_title(&self.pool, limit as i64).await
    }

    async fn recipes_by_ids(&self, ids: &[RecipeId]) -> Result<Vec<Recipe>> {
        db::recipes::get_recipes_by_ids(&self.pool, ids).await
    }

    async fn count_by_feature(&self, group: &GroupCount) -> Result<Vec<CuisineCount>> {
        db::recipes::count_by_feature(&self.pool, group).await
    }

    async fn vector_search(&self, query: &VectorQuery) -> Result<Vec<VectorHit>> {
        self.check_vector_query(query)?;

        let embeddings = db::recipes::list_embeddings(&self.pool).await?;
        let scanned = embeddings.len();

        let mut ranked = top_candidates(
            &query.vector,
            embeddings,
            query.num_candidates,
            |id, dims| {
                warn!(
                    "Skipping recipe {}: embedding has {} dimensions, query has {}",
                    id,
                    dims,
                    query.vector.len()
                )
            },
        );
        ranked.truncate(query.limit);

        debug!(
            "Vector search scanned {} embeddings, kept {}",
            scanned,
            ranked.len()
        );

        let ids: Vec<RecipeId> = ranked.iter().map(|(id, _)| id.clone()).collect();
        let mut documents: HashMap<RecipeId, Recipe> =
            db::recipes::get_recipes_by_ids(&self.pool, &ids)
                .await?
                .into_iter()
                .map(|r| (r.id.clone(), r))
                .collect();

        Ok(ranked
            .into_iter()
            .filter_map(|(id, score)| {
                documents
                    .remove(&id)
                    .map(|recipe| VectorHit::from_recipe(recipe, score))
            })
            .collect())
    }

    async fn fuzzy_search(&self, query: &TextQuery) -> Result<Vec<TextHit>> {
        if query.index != self.text_index_name {
            return Err(Error::InvalidArgument(format!(
                "Unknown text index: {}",
                query.index
            )));
        }

        let hits = self.text_index.fuzzy_search(&query.text, query.limit)?;
        Ok(hits
            .into_iter()
            .map(|hit| TextHit {
                id: hit.recipe_id,
                score: hit.score,
            })
            .collect())
    }

    async fn insert_recipe(&self, recipe: &NewRecipe) -> Result<RecipeId> {
        let created = db::recipes::create_recipe(&self.pool, recipe).await?;

        let _guard = self.writer_lock.lock().await;
        let mut writer = self.text_index.writer()?;
        self.text_index.index_recipe(&mut writer, &created)?;
        self.text_index.commit(&mut writer)?;

        Ok(created.id)
    }

    async fn recipes_missing_embedding(&self) -> Result<Vec<Recipe>> {
        db::recipes::list_missing_embedding(&self.pool).await
    }

    async fn store_embedding(&self, id: &RecipeId, embedding: &[f32]) -> Result<bool> {
        db::recipes::set_embedding_if_missing(&self.pool, id, embedding).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Features, FeatureField};
    use tempfile::TempDir;

    async fn test_store() -> (TempDir, LocalStore) {
        let pool = db::init_pool("sqlite::memory:").await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let index = SearchIndex::new(dir.path()).unwrap();
        (dir, LocalStore::new(pool, index, "default", "recipe_vector_index"))
    }

    fn new_recipe(title: &str, ingredients: &[&str]) -> NewRecipe {
        NewRecipe {
            title: title.to_string(),
            instructions: String::new(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            embedding_ingredients: Some(ingredients.join(", ")),
            features: Some(Features::default()),
        }
    }

    async fn insert_with_embedding(store: &LocalStore, title: &str, embedding: &[f32]) -> RecipeId {
        let id = store.insert_recipe(&new_recipe(title, &[])).await.unwrap();
        assert!(store.store_embedding(&id, embedding).await.unwrap());
        id
    }

    #[tokio::test]
    async fn test_vector_search_orders_by_similarity() {
        let (_dir, store) = test_store().await;
        let far = insert_with_embedding(&store, "Far", &[-1.0, 0.0]).await;
        let near = insert_with_embedding(&store, "Near", &[1.0, 0.1]).await;
        let mid = insert_with_embedding(&store, "Mid", &[0.5, 0.5]).await;

        let query = VectorQuery::new("recipe_vector_index", vec![1.0, 0.0], 2);
        let hits = store.vector_search(&query).await.unwrap();

        let ids: Vec<RecipeId> = hits.iter().filter_map(|h| h.id.clone()).collect();
        assert_eq!(ids, vec![near, mid]);
        assert!(!ids.contains(&far));
        assert!(hits[0].score >= hits[1].score);
        assert_eq!(hits[0].title.as_deref(), Some("Near"));
    }

    #[tokio::test]
    async fn test_vector_search_skips_unembedded_and_mismatched() {
        let (_dir, store) = test_store().await;
        store.insert_recipe(&new_recipe("Pending", &[])).await.unwrap();
        insert_with_embedding(&store, "Wrong dims", &[1.0, 0.0, 0.0]).await;
        let ok = insert_with_embedding(&store, "Right dims", &[0.0, 1.0]).await;

        let query = VectorQuery::new("recipe_vector_index", vec![0.0, 1.0], 5);
        let hits = store.vector_search(&query).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_ref(), Some(&ok));
    }

    #[tokio::test]
    async fn test_vector_search_validates_query() {
        let (_dir, store) = test_store().await;

        let wrong_index = VectorQuery::new("other_index", vec![1.0], 5);
        assert!(matches!(
            store.vector_search(&wrong_index).await,
            Err(Error::InvalidArgument(_))
        ));

        let small_pool = VectorQuery::new("recipe_vector_index", vec![1.0], 5).with_candidates(2);
        assert!(matches!(
            store.vector_search(&small_pool).await,
            Err(Error::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_inserted_recipes_are_fuzzy_searchable() {
        let (_dir, store) = test_store().await;
        let id = store
            .insert_recipe(&new_recipe("Chickpea curry", &["chickpeas", "coconut milk"]))
            .await
            .unwrap();

        let query = TextQuery {
            index: "default".to_string(),
            text: "chikpea".to_string(),
            limit: 50,
        };
        let hits = store.fuzzy_search(&query).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);

        let wrong = TextQuery {
            index: "missing".to_string(),
            ..query
        };
        assert!(store.fuzzy_search(&wrong).await.is_err());
    }

    #[tokio::test]
    async fn test_rebuild_text_index() {
        let (_dir, store) = test_store().await;
        store.insert_recipe(&new_recipe("Focaccia", &["flour"])).await.unwrap();
        store.insert_recipe(&new_recipe("Ciabatta", &["flour"])).await.unwrap();

        assert_eq!(store.rebuild_text_index().await.unwrap(), 2);

        let query = TextQuery {
            index: "default".to_string(),
            text: "flour".to_string(),
            limit: 50,
        };
        assert_eq!(store.fuzzy_search(&query).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_count_by_feature_delegates_to_database() {
        let (_dir, store) = test_store().await;
        store.insert_recipe(&new_recipe("Plain", &[])).await.unwrap();

        let stats = store
            .count_by_feature(&GroupCount::new(FeatureField::Cuisine))
            .await
            .unwrap();
        assert_eq!(stats[0].cuisine, "Unspecified");
        assert_eq!(stats[0].count, 1);
    }
}
