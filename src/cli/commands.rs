use std::path::Path;
use std::time::Duration;

use crate::clients::Embedder;
use crate::db::models::{CuisineCount, Recipe};
use crate::jobs;
use crate::orchestrator::{SearchResult, SearchService, SuggestionOutcome};
use crate::store::LocalStore;
use crate::Result;

/// Import a JSON file and print a summary
pub async fn import(service: &SearchService, file: &Path) -> Result<()> {
    let report = jobs::import_file(service.store().as_ref(), file).await?;

    println!(
        "\u{2713} Imported {} of {} recipes ({} failed)",
        report.inserted, report.total, report.failed
    );
    Ok(())
}

/// Embed every recipe that has no vector yet
pub async fn backfill(service: &SearchService, embedder: &dyn Embedder, delay: Duration) -> Result<()> {
    let report = jobs::backfill_embeddings(service.store().as_ref(), embedder, delay).await?;

    println!(
        "\u{2713} Embedded {} of {} recipes ({} skipped, {} failed)",
        report.embedded, report.pending, report.skipped, report.failed
    );
    Ok(())
}

pub async fn reindex(store: &LocalStore) -> Result<()> {
    let count = store.rebuild_text_index().await?;
    println!("\u{2713} Indexed {count} recipes");
    Ok(())
}

pub async fn search(service: &SearchService, query: &str, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(service.options().vector_limit);
    let outcome = service.ingredient_search(query, limit).await;

    if let Some(err) = &outcome.error {
        println!("Search failed: {err}");
    }
    print_search_results(&outcome.results);
    Ok(())
}

pub async fn fuzzy(service: &SearchService, query: &str) -> Result<()> {
    let outcome = service.fuzzy_search(query).await;

    if let Some(err) = &outcome.error {
        println!("Search failed: {err}");
    }
    print_recipes(&outcome.results);
    Ok(())
}

pub async fn suggest(service: &SearchService, ingredients: &str) -> Result<()> {
    match service.meal_suggestions(ingredients).await {
        SuggestionOutcome::Suggestions(suggestions) => {
            for suggestion in suggestions {
                println!("{suggestion}\n");
            }
        }
        outcome => {
            if let Some(message) = outcome.error_message() {
                println!("{message}");
            }
        }
    }
    Ok(())
}

pub async fn stats(service: &SearchService) -> Result<()> {
    let outcome = service.cuisine_statistics().await;

    if let Some(err) = &outcome.error {
        println!("Statistics failed: {err}");
    }
    print_stats(&outcome.results);
    Ok(())
}

fn print_search_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No recipes found");
        return;
    }

    println!("\nFound {} recipes:\n", results.len());
    println!("{:<26} {:<40} {:>6}", "ID", "Title", "Score");
    println!("{}", "-".repeat(74));

    for result in results {
        println!(
            "{:<26} {:<40} {:>6.3}",
            result.id,
            truncate(&result.title, 38),
            result.similarity_score
        );
    }
}

fn print_recipes(recipes: &[Recipe]) {
    if recipes.is_empty() {
        println!("No recipes found");
        return;
    }

    println!("\nFound {} recipes:\n", recipes.len());
    println!("{:<26} {:<40}", "ID", "Title");
    println!("{}", "-".repeat(66));

    for recipe in recipes {
        println!("{:<26} {:<40}", recipe.id, truncate(&recipe.title, 38));
    }
}

fn print_stats(stats: &[CuisineCount]) {
    println!("{:<30} {:>8}", "Cuisine", "Recipes");
    println!("{}", "-".repeat(39));

    for entry in stats {
        println!("{:<30} {:>8}", truncate(&entry.cuisine, 28), entry.count);
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Pho", 10), "Pho");
        assert_eq!(truncate("Spaghetti alla carbonara", 12), "Spaghetti...");
        assert_eq!(truncate("Crème brûlée à l'orange", 8), "Crème...");
    }
}
