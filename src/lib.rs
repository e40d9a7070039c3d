pub mod config;
pub mod db;
pub mod error;

// Remote services and storage
pub mod clients;
pub mod indexer;
pub mod store;

// Request flows
pub mod orchestrator;

// Offline jobs
pub mod jobs;

// Interfaces
pub mod api;
pub mod cli;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use config::Settings;
pub use error::{Error, Result};
