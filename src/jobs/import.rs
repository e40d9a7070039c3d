use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::db::models::NewRecipe;
use crate::store::RecipeStore;
use crate::{Error, Result};

/// Outcome of a JSON import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub total: usize,
    pub inserted: usize,
    pub failed: usize,
}

/// Load recipes from a file holding a JSON array of recipe documents.
///
/// Records that fail to decode or insert are logged and counted; they never
/// abort the import.
pub async fn import_file(store: &dyn RecipeStore, path: impl AsRef<Path>) -> Result<ImportReport> {
    let path = path.as_ref();
    info!("Importing recipes from {}", path.display());

    let content = tokio::fs::read_to_string(path).await?;
    let records = match serde_json::from_str::<Value>(&content)? {
        Value::Array(records) => records,
        _ => {
            return Err(Error::InvalidArgument(format!(
                "{} does not contain a JSON array",
                path.display()
            )))
        }
    };

    let mut report = ImportReport {
        total: records.len(),
        ..Default::default()
    };

    for (position, record) in records.into_iter().enumerate() {
        let recipe: NewRecipe = match serde_json::from_value(record) {
            Ok(recipe) => recipe,
            Err(e) => {
                report.failed += 1;
                warn!("Skipping record {}: {}", position, e);
                continue;
            }
        };

        match store.insert_recipe(&recipe).await {
            Ok(id) => {
                report.inserted += 1;
                debug!("Imported '{}' as {}", recipe.title, id);
            }
            Err(e) => {
                report.failed += 1;
                warn!("Failed to import '{}': {}", recipe.title, e.log_safe());
            }
        }
    }

    info!(
        "Import complete: {} records, {} inserted, {} failed",
        report.total, report.inserted, report.failed
    );
    Ok(report)
}
