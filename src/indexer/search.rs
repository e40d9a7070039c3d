use crate::db::models::{Recipe, RecipeId};
use crate::error::{Error, Result};
use crate::indexer::schema::RecipeSchema;
use levenshtein_automata::{Distance, LevenshteinAutomatonBuilder, DFA};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, OwnedValue};
use tantivy::tokenizer::TokenStream;
use tantivy::{
    doc, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, Term,
};
use tracing::{debug, info};

/// Maximum character edits tolerated per query term
pub const MAX_EDITS: u8 = 2;

/// Extra weight for index terms equal to the query term
const EXACT_MATCH_BOOST: f32 = 2.0;

/// Per-field fuzzy matching rules
#[derive(Debug, Clone, Copy)]
struct FuzzyField {
    field: Field,
    /// Leading characters that must match exactly
    prefix_len: usize,
    boost: f32,
}

pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    schema: RecipeSchema,
    /// Edit-distance automata, transpositions counting as one edit
    levenshtein: LevenshteinAutomatonBuilder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub recipe_id: RecipeId,
    pub score: f32,
}

impl SearchIndex {
    /// Create or open search index
    pub fn new(index_path: impl AsRef<Path>) -> Result<Self> {
        let path = index_path.as_ref();
        let schema = RecipeSchema::new();

        // Create directory if it doesn't exist
        std::fs::create_dir_all(path)?;

        // Open or create index
        let index = if path.join("meta.json").exists() {
            Index::open_in_dir(path)
                .map_err(|e| Error::Search(format!("Failed to open index: {e}")))?
        } else {
            Index::create_in_dir(path, schema.schema.clone())
                .map_err(|e| Error::Search(format!("Failed to create index: {e}")))?
        };

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| Error::Search(format!("Failed to create reader: {e}")))?;

        info!("Search index initialized at {:?}", path);

        Ok(Self {
            index,
            reader,
            schema,
            levenshtein: LevenshteinAutomatonBuilder::new(MAX_EDITS, true),
        })
    }

    /// Get index writer
    pub fn writer(&self) -> Result<IndexWriter> {
        self.index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| Error::Search(format!("Failed to create writer: {e}")))
    }

    /// Index a recipe, replacing any previous version of it
    pub fn index_recipe(&self, writer: &mut IndexWriter, recipe: &Recipe) -> Result<()> {
        debug!("Indexing recipe: {}", recipe.id);

        self.delete_recipe(writer, &recipe.id);

        let mut doc = doc!(
            self.schema.id => recipe.id.to_string(),
            self.schema.title => recipe.title.clone(),
            self.schema.instructions => recipe.instructions.clone(),
        );

        for ingredient in &recipe.ingredients {
            doc.add_text(self.schema.ingredients, ingredient);
        }

        writer.add_document(doc)?;

        Ok(())
    }

    /// Delete a recipe from the index
    pub fn delete_recipe(&self, writer: &mut IndexWriter, recipe_id: &RecipeId) {
        let term = Term::from_field_text(self.schema.id, recipe_id.as_str());
        writer.delete_term(term);
    }

    /// Drop every indexed document
    pub fn clear(&self, writer: &mut IndexWriter) -> Result<()> {
        writer
            .delete_all_documents()
            .map_err(|e| Error::Search(format!("Failed to clear index: {e}")))?;
        Ok(())
    }

    /// Commit changes and make them visible to searches
    pub fn commit(&self, writer: &mut IndexWriter) -> Result<()> {
        writer
            .commit()
            .map_err(|e| Error::Search(format!("Failed to commit: {e}")))?;
        self.reader
            .reload()
            .map_err(|e| Error::Search(format!("Failed to reload reader: {e}")))?;
        Ok(())
    }

    fn fuzzy_fields(&self) -> [FuzzyField; 3] {
        [
            FuzzyField {
                field: self.schema.title,
                prefix_len: 2,
                boost: 5.0,
            },
            FuzzyField {
                field: self.schema.ingredients,
                prefix_len: 1,
                boost: 3.0,
            },
            FuzzyField {
                field: self.schema.instructions,
                prefix_len: 1,
                boost: 1.0,
            },
        ]
    }

    /// Split free text into index terms using the title analyzer
    fn query_terms(&self, text: &str) -> Result<Vec<String>> {
        let mut analyzer = self.index.tokenizer_for_field(self.schema.title)?;
        let mut stream = analyzer.token_stream(text);

        let mut terms: Vec<String> = Vec::new();
        while stream.advance() {
            let term = stream.token().text.clone();
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        Ok(terms)
    }

    /// Index terms of `rule.field` that start with the query term's
    /// prefix and lie within `MAX_EDITS` of the whole query term.
    /// Both conditions apply to the same word.
    fn matching_terms(
        &self,
        searcher: &Searcher,
        rule: FuzzyField,
        term: &str,
        dfa: &DFA,
    ) -> Result<BTreeSet<String>> {
        let prefix: String = term.chars().take(rule.prefix_len).collect();
        let prefix = prefix.as_bytes();

        let mut matches = BTreeSet::new();
        for segment in searcher.segment_readers() {
            let inverted_index = segment.inverted_index(rule.field)?;
            let mut stream = inverted_index.terms().range().ge(prefix).into_stream()?;

            while stream.advance() {
                let key = stream.key();
                if !key.starts_with(prefix) {
                    break;
                }
                if let Distance::Exact(_) = dfa.eval(key) {
                    if let Ok(word) = std::str::from_utf8(key) {
                        matches.insert(word.to_string());
                    }
                }
            }
        }
        Ok(matches)
    }

    /// Typo-tolerant clause for one term in one field, or `None` when no
    /// index term qualifies. Exact hits score higher.
    fn fuzzy_clause(
        &self,
        searcher: &Searcher,
        rule: FuzzyField,
        term: &str,
        dfa: &DFA,
    ) -> Result<Option<Box<dyn Query>>> {
        let matches = self.matching_terms(searcher, rule, term, dfa)?;
        if matches.is_empty() {
            return Ok(None);
        }

        let alternatives: Vec<(Occur, Box<dyn Query>)> = matches
            .iter()
            .map(|word| {
                let query: Box<dyn Query> = Box::new(TermQuery::new(
                    Term::from_field_text(rule.field, word),
                    IndexRecordOption::WithFreqs,
                ));
                let query = if word == term {
                    Box::new(BoostQuery::new(query, EXACT_MATCH_BOOST))
                } else {
                    query
                };
                (Occur::Should, query)
            })
            .collect();

        let clause = BooleanQuery::new(alternatives);
        Ok(Some(Box::new(BoostQuery::new(Box::new(clause), rule.boost))))
    }

    /// Fuzzy search across title, ingredients and instructions.
    /// Returns at most `limit` hits, best first.
    pub fn fuzzy_search(&self, text: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let terms = self.query_terms(text)?;
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for term in &terms {
            let dfa = self.levenshtein.build_dfa(term);
            for rule in self.fuzzy_fields() {
                if let Some(clause) = self.fuzzy_clause(&searcher, rule, term, &dfa)? {
                    clauses.push((Occur::Should, clause));
                }
            }
        }
        if clauses.is_empty() {
            return Ok(Vec::new());
        }
        let query = BooleanQuery::new(clauses);

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .map_err(|e| Error::Search(format!("Search failed: {e}")))?;

        let results = top_docs
            .into_iter()
            .filter_map(|(score, doc_address)| {
                let doc = searcher.doc::<TantivyDocument>(doc_address).ok()?;

                let recipe_id = match doc.get_first(self.schema.id)? {
                    OwnedValue::Str(s) => RecipeId::from_stored(s.to_string()),
                    _ => return None,
                };

                Some(SearchResult { recipe_id, score })
            })
            .collect();

        Ok(results)
    }

    /// Number of searchable documents
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn recipe(title: &str, ingredients: &[&str], instructions: &str) -> Recipe {
        Recipe {
            id: RecipeId::generate(),
            title: title.to_string(),
            instructions: instructions.to_string(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            embedding_ingredients: None,
            features: None,
            voyage_embedding: None,
            created_at: Utc::now(),
        }
    }

    fn build_index(recipes: &[Recipe]) -> (tempfile::TempDir, SearchIndex) {
        let dir = tempdir().unwrap();
        let index = SearchIndex::new(dir.path()).unwrap();
        let mut writer = index.writer().unwrap();
        for r in recipes {
            index.index_recipe(&mut writer, r).unwrap();
        }
        index.commit(&mut writer).unwrap();
        (dir, index)
    }

    #[test]
    fn test_create_index() {
        let dir = tempdir().unwrap();
        let index = SearchIndex::new(dir.path());
        assert!(index.is_ok());
    }

    #[test]
    fn test_fuzzy_search_tolerates_typos() {
        let lasagne = recipe("Lasagne", &["pasta sheets", "tomato"], "Layer and bake.");
        let (_dir, index) = build_index(&[lasagne.clone()]);

        let hits = index.fuzzy_search("lasagna", 50).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].recipe_id, lasagne.id);

        let hits = index.fuzzy_search("tomatto", 50).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_title_matches_outrank_instruction_matches() {
        let in_title = recipe("Garlic bread", &["bread"], "Toast it.");
        let in_instructions = recipe("Soup", &["water"], "Add garlic at the end.");
        let (_dir, index) = build_index(&[in_instructions.clone(), in_title.clone()]);

        let hits = index.fuzzy_search("garlic", 50).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].recipe_id, in_title.id);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_title_prefix_must_match() {
        // "pasta" is within two edits of "basta" but the title prefix differs
        let (_dir, index) = build_index(&[recipe("Basta", &[], "")]);
        assert!(index.fuzzy_search("pasta", 50).unwrap().is_empty());
    }

    #[test]
    fn test_prefix_and_edit_distance_apply_to_the_same_word() {
        // "basta" is close to "pasta" and "panini" shares its prefix,
        // but neither word satisfies both rules
        let (_dir, index) = build_index(&[
            recipe("Basta", &[], ""),
            recipe("Basta panini", &[], ""),
        ]);
        assert!(index.fuzzy_search("pasta", 50).unwrap().is_empty());

        let penne = recipe("Penne pasta bake", &[], "");
        let (_dir, index) = build_index(&[recipe("Basta panini", &[], ""), penne.clone()]);
        let hits = index.fuzzy_search("pastta", 50).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].recipe_id, penne.id);
    }

    #[test]
    fn test_exact_matches_outrank_typo_matches() {
        let exact = recipe("Tomato soup", &[], "");
        let close = recipe("Tomate soup", &[], "");
        let (_dir, index) = build_index(&[close.clone(), exact.clone()]);

        let hits = index.fuzzy_search("tomato", 50).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].recipe_id, exact.id);
    }

    #[test]
    fn test_limit_and_empty_query() {
        let recipes: Vec<Recipe> = (0..5)
            .map(|i| recipe(&format!("Curry {i}"), &["rice"], ""))
            .collect();
        let (_dir, index) = build_index(&recipes);

        assert_eq!(index.fuzzy_search("curry", 3).unwrap().len(), 3);
        assert!(index.fuzzy_search("   ", 50).unwrap().is_empty());
    }

    #[test]
    fn test_reindexing_replaces_document() {
        let mut soup = recipe("Onion soup", &["onion"], "");
        let (_dir, index) = build_index(&[soup.clone()]);

        soup.title = "Leek soup".to_string();
        let mut writer = index.writer().unwrap();
        index.index_recipe(&mut writer, &soup).unwrap();
        index.commit(&mut writer).unwrap();

        assert_eq!(index.num_docs(), 1);
        assert_eq!(index.fuzzy_search("leek", 50).unwrap().len(), 1);
    }
}
