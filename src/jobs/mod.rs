//! Offline maintenance jobs run from the CLI

pub mod backfill;
pub mod import;

pub use backfill::{backfill_embeddings, BackfillReport};
pub use import::{import_file, ImportReport};
