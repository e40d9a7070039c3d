use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clients::{Embedder, InputType};
use crate::store::RecipeStore;
use crate::Result;

/// Outcome of an embedding backfill run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Documents without an embedding when the run started
    pub pending: usize,
    pub embedded: usize,
    /// Documents that gained an embedding from elsewhere mid-run
    pub skipped: usize,
    pub failed: usize,
}

/// Compute and store document embeddings for every recipe that lacks one.
///
/// Remote calls are spaced by `delay` to stay under the provider's rate
/// limit. Per-document failures are logged and skipped.
pub async fn backfill_embeddings(
    store: &dyn RecipeStore,
    embedder: &dyn Embedder,
    delay: Duration,
) -> Result<BackfillReport> {
    let pending = store.recipes_missing_embedding().await?;
    let mut report = BackfillReport {
        pending: pending.len(),
        ..Default::default()
    };

    info!("Backfilling embeddings for {} recipes", report.pending);

    for (position, recipe) in pending.iter().enumerate() {
        if position > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let embedding = match embedder
            .embed(&recipe.embedding_source(), InputType::Document)
            .await
        {
            Ok(embedding) => embedding,
            Err(e) => {
                report.failed += 1;
                warn!("Failed to embed recipe {}: {}", recipe.id, e.log_safe());
                continue;
            }
        };

        match store.store_embedding(&recipe.id, &embedding).await {
            Ok(true) => {
                report.embedded += 1;
                debug!("Stored embedding for '{}'", recipe.title);
            }
            Ok(false) => {
                report.skipped += 1;
                debug!("Recipe {} already has an embedding", recipe.id);
            }
            Err(e) => {
                report.failed += 1;
                warn!("Failed to store embedding for {}: {}", recipe.id, e.log_safe());
            }
        }
    }

    info!(
        "Backfill complete: {} pending, {} embedded, {} skipped, {} failed",
        report.pending, report.embedded, report.skipped, report.failed
    );
    Ok(report)
}
