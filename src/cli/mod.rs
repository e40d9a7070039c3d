// Command-line interface

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cookbook")]
#[command(about = "Cookbook - recipe search and meal suggestions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,
    },

    /// Run database migrations
    Migrate,

    /// Import recipes from a JSON array file
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Compute embeddings for recipes that have none
    Backfill {
        /// Pause between embedding requests
        #[arg(long)]
        delay_seconds: Option<u64>,
    },

    /// Rebuild the full-text index from the database
    Reindex,

    /// Search recipes by ingredients
    Search {
        /// Ingredient query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Typo-tolerant search on titles, ingredients and instructions
    Fuzzy {
        /// Search text
        query: String,
    },

    /// Suggest meals for a comma-separated ingredient list
    Suggest {
        /// Ingredients, e.g. "eggs, spinach, feta"
        ingredients: String,
    },

    /// Show recipe counts per cuisine
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_with_limit() {
        let cli = Cli::try_parse_from(["cookbook", "search", "eggs, feta", "--limit", "5"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Search {
                query: "eggs, feta".to_string(),
                limit: Some(5)
            }
        );
    }

    #[test]
    fn test_parse_import_requires_file() {
        assert!(Cli::try_parse_from(["cookbook", "import"]).is_err());

        let cli = Cli::try_parse_from(["cookbook", "import", "recipes.json"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Import {
                file: PathBuf::from("recipes.json")
            }
        );
    }
}
