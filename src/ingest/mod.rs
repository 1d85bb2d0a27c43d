// Ingestion pipeline module
// Streams JSONL embedding records into the module catalog

pub mod progress;
pub mod record;


pub use progress::{BarProgress, DecileProgress, LogProgress, NoProgress, ProgressReporter};
pub use record::{DimensionPolicy, DocRecord, SkipCounts, SkipReason};

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::NewApiDoc;

/// Storage operations the ingestion driver needs. [`crate::database::Database`]
/// implements this against PostgreSQL; tests substitute an in-memory store.
#[async_trait]
pub trait DocStore: Send + Sync {
    /// Resolve a module id by its unique name, creating a placeholder row
    /// when none exists.
    async fn resolve_module(&self, name: &str, label: Option<&str>) -> Result<Uuid>;

    /// Insert staged chunks in one transaction, returning how many rows were
    /// actually written. Chunks already present are dropped silently.
    async fn insert_chunks(&self, docs: &[NewApiDoc]) -> Result<u64>;

    /// Recompute the module's mean embedding over its stored chunks.
    async fn refresh_module_embedding(&self, module_id: Uuid) -> Result<()>;
}

/// Counters summarizing one ingested file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    pub loaded: u64,
    pub duplicates: u64,
    pub skipped: SkipCounts,
}

/// Streams JSONL embedding records into a [`DocStore`], one file per call.
///
/// Records are validated and staged in memory, then written in batches of
/// `batch_size` rows, each batch in its own transaction. Invalid records are
/// skipped and counted without aborting the stream.
#[derive(Debug, Clone)]
pub struct Loader {
    dimension: usize,
    batch_size: usize,
    policy: DimensionPolicy,
}

impl Loader {
    #[inline]
    pub fn new(dimension: usize, batch_size: usize, policy: DimensionPolicy) -> Self {
        Self {
            dimension,
            batch_size,
            policy,
        }
    }

    /// Ingests one JSONL embeddings file into the named module.
    ///
    /// A missing or unreadable input file is tolerated: the outcome is empty
    /// and the store is never touched. Module resolution and batch commit
    /// failures abort the file; batches committed before the failure stay
    /// durable.
    pub async fn load_file(
        &self,
        store: &dyn DocStore,
        path: &Path,
        module_name: &str,
        module_label: Option<&str>,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<LoadOutcome> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Skipping input file {}: {}", path.display(), e);
                return Ok(LoadOutcome::default());
            }
        };

        let bytes_total = file
            .metadata()
            .with_context(|| format!("Failed to stat input file: {}", path.display()))?
            .len();

        let module_id = store
            .resolve_module(module_name, module_label)
            .await
            .with_context(|| format!("Failed to resolve module {module_name}"))?;

        info!(
            "Loading {} into module {} ({} bytes)",
            path.display(),
            module_name,
            bytes_total
        );

        let mut reader = BufReader::new(file);
        let mut outcome = LoadOutcome::default();
        let mut staged: Vec<NewApiDoc> = Vec::with_capacity(self.batch_size);
        let mut bytes_done = 0u64;
        let mut line_number = 0u64;
        let mut raw_line = Vec::new();

        loop {
            raw_line.clear();
            let read = reader
                .read_until(b'\n', &mut raw_line)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?;
            if read == 0 {
                break;
            }

            line_number += 1;
            bytes_done += read as u64;

            // Invalid UTF-8 garbles one record, not the whole stream.
            let line = String::from_utf8_lossy(&raw_line);
            let line = line.trim();
            if !line.is_empty() {
                match record::parse_line(line, self.dimension, self.policy) {
                    Ok(doc) => {
                        staged.push(doc.into_new_api_doc(module_id));
                        if staged.len() >= self.batch_size {
                            self.flush(store, &mut staged, &mut outcome).await?;
                        }
                    }
                    Err(reason) => {
                        warn!(
                            "Skipping record at line {} of {}: {} ({})",
                            line_number,
                            path.display(),
                            reason,
                            record::line_preview(line)
                        );
                        outcome.skipped.record(&reason);
                    }
                }
            }

            reporter.report(bytes_done, bytes_total);
        }

        self.flush(store, &mut staged, &mut outcome).await?;
        reporter.finish();

        store
            .refresh_module_embedding(module_id)
            .await
            .with_context(|| format!("Failed to refresh embedding for module {module_name}"))?;

        info!(
            "Finished {}: {} loaded, {} duplicates, {} skipped",
            path.display(),
            outcome.loaded,
            outcome.duplicates,
            outcome.skipped.total()
        );

        Ok(outcome)
    }

    async fn flush(
        &self,
        store: &dyn DocStore,
        staged: &mut Vec<NewApiDoc>,
        outcome: &mut LoadOutcome,
    ) -> Result<()> {
        if staged.is_empty() {
            return Ok(());
        }

        let written = store
            .insert_chunks(staged)
            .await
            .context("Failed to commit staged chunks")?;

        let staged_count = staged.len() as u64;
        outcome.loaded += written;
        outcome.duplicates += staged_count.saturating_sub(written);
        staged.clear();

        Ok(())
    }
}
