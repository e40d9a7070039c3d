use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub embedding: EmbeddingConfig,
    pub suggestion: SuggestionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_rate_limit: u64,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Directory holding the full-text indexes
    pub index_path: PathBuf,
    pub text_index_name: String,
    pub vector_index_name: String,
    pub vector_limit: usize,
    /// Candidate pool = multiplier x limit
    pub candidate_multiplier: usize,
    pub fuzzy_limit: usize,
    pub top_recipes_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub backfill_delay_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_suggestions: usize,
}

/// Read `key` from the environment, falling back to `default`
fn env_or<T: FromStr>(key: &str, default: &str) -> Result<T> {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| Error::Config(format!("Invalid {key} value")))
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Settings {
            database: DatabaseConfig {
                url: env_or("DATABASE_URL", "sqlite:./data/cookbook.db")?,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", "25")?,
                min_connections: env_or("DATABASE_MIN_CONNECTIONS", "5")?,
                connection_timeout_seconds: env_or("DATABASE_CONNECTION_TIMEOUT", "30")?,
                idle_timeout_seconds: env_or("DATABASE_IDLE_TIMEOUT", "600")?,
            },
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0")?,
                port: env_or("PORT", "3000")?,
                api_rate_limit: env_or("API_RATE_LIMIT", "10")?,
                max_request_body_size: env_or("MAX_REQUEST_BODY_SIZE", "1048576")?,
            },
            search: SearchConfig {
                index_path: env_or("INDEX_PATH", "./data/index")?,
                text_index_name: env_or("TEXT_INDEX_NAME", "default")?,
                vector_index_name: env_or("VECTOR_INDEX_NAME", "recipe_vector_index")?,
                vector_limit: env_or("VECTOR_SEARCH_LIMIT", "10")?,
                candidate_multiplier: env_or("CANDIDATE_MULTIPLIER", "3")?,
                fuzzy_limit: env_or("FUZZY_SEARCH_LIMIT", "50")?,
                top_recipes_limit: env_or("TOP_RECIPES_LIMIT", "20")?,
            },
            embedding: EmbeddingConfig {
                api_key: std::env::var("VOYAGE_API_KEY").ok(),
                model: env_or("VOYAGE_MODEL", "voyage-lite-01-instruct")?,
                base_url: env_or("VOYAGE_BASE_URL", "https://api.voyageai.com/v1")?,
                backfill_delay_seconds: env_or("BACKFILL_DELAY_SECONDS", "25")?,
            },
            suggestion: SuggestionConfig {
                api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
                model: env_or("ANTHROPIC_MODEL", "claude-3-haiku-20240307")?,
                base_url: env_or("ANTHROPIC_BASE_URL", "https://api.anthropic.com/v1")?,
                max_tokens: env_or("SUGGESTION_MAX_TOKENS", "1500")?,
                temperature: env_or("SUGGESTION_TEMPERATURE", "0.7")?,
                max_suggestions: env_or("MAX_SUGGESTIONS", "4")?,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("Port must be non-zero".to_string()));
        }

        if self.server.api_rate_limit == 0 {
            return Err(Error::Config("API rate limit must be non-zero".to_string()));
        }

        if self.search.vector_limit == 0 || self.search.fuzzy_limit == 0 {
            return Err(Error::Config("Search limits must be non-zero".to_string()));
        }

        if self.search.candidate_multiplier == 0 {
            return Err(Error::Config(
                "Candidate multiplier must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.suggestion.temperature) {
            return Err(Error::Config(
                "Suggestion temperature must be between 0 and 1".to_string(),
            ));
        }

        if self.suggestion.max_suggestions == 0 {
            return Err(Error::Config("MAX_SUGGESTIONS must be non-zero".to_string()));
        }

        url::Url::parse(&self.embedding.base_url)?;
        url::Url::parse(&self.suggestion.base_url)?;

        Ok(())
    }

    /// Directory of the full-text index named by `text_index_name`
    pub fn text_index_dir(&self) -> PathBuf {
        self.search.index_path.join(&self.search.text_index_name)
    }
}

#[cfg(test)]
pub(crate) fn test_settings() -> Settings {
    Settings {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
            min_connections: 1,
            connection_timeout_seconds: 30,
            idle_timeout_seconds: 600,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_rate_limit: 10,
            max_request_body_size: 1_048_576,
        },
        search: SearchConfig {
            index_path: "/tmp/cookbook-index".into(),
            text_index_name: "default".to_string(),
            vector_index_name: "recipe_vector_index".to_string(),
            vector_limit: 10,
            candidate_multiplier: 3,
            fuzzy_limit: 50,
            top_recipes_limit: 20,
        },
        embedding: EmbeddingConfig {
            api_key: None,
            model: "voyage-lite-01-instruct".to_string(),
            base_url: "https://api.voyageai.com/v1".to_string(),
            backfill_delay_seconds: 25,
        },
        suggestion: SuggestionConfig {
            api_key: None,
            model: "claude-3-haiku-20240307".to_string(),
            base_url: "https://api.anthropic.com/v1".to_string(),
            max_tokens: 1500,
            temperature: 0.7,
            max_suggestions: 4,
        },
    }
}
