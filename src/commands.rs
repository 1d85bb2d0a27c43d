use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::{Config, SourceEntry};
use crate::database::Database;
use crate::ingest::{BarProgress, DecileProgress, Loader, LogProgress, ProgressReporter};

/// Create or update the catalog schema and vector indexes
#[inline]
pub async fn init_schema(config: &Config) -> Result<()> {
    info!(
        "Initializing schema in {} at {}:{}",
        config.database.dbname, config.database.host, config.database.port
    );

    let database = Database::connect(config)
        .await
        .context("Failed to connect to PostgreSQL")?;
    database.run_migrations().await?;

    println!("✓ Schema is ready");
    println!(
        "  Database: {} at {}:{}",
        config.database.dbname, config.database.host, config.database.port
    );
    println!("  Embedding dimension: {}", config.ingest.dimension);

    Ok(())
}

/// Load JSONL embedding files into the module catalog
#[inline]
pub async fn load_files(
    config: &Config,
    file: Option<PathBuf>,
    module: Option<String>,
    label: Option<String>,
) -> Result<()> {
    let sources = resolve_sources(config, file, module, label)?;

    if sources.is_empty() {
        println!("No sources to load.");
        println!("Pass --file and --module, or add [[sources]] entries to the config file.");
        return Ok(());
    }

    let database = Database::connect(config)
        .await
        .context("Failed to connect to PostgreSQL")?;
    database.run_migrations().await?;

    let loader = Loader::new(
        config.ingest.dimension,
        config.ingest.batch_size,
        config.ingest.dimension_policy,
    );

    let mut loaded = 0u64;
    let mut duplicates = 0u64;
    let mut skipped = 0u64;
    let mut failures = 0usize;

    for source in &sources {
        let mut reporter = make_reporter();
        match loader
            .load_file(
                &database,
                &source.file,
                &source.module,
                source.label.as_deref(),
                reporter.as_mut(),
            )
            .await
        {
            Ok(outcome) => {
                // A clean run that loaded nothing usually means the wrong
                // file or a dimension mismatch across every record.
                if outcome.loaded == 0 {
                    warn!(
                        "No records loaded from {} ({} skipped)",
                        source.file.display(),
                        outcome.skipped.total()
                    );
                }

                let marker = if outcome.loaded == 0 { "⚠" } else { "✓" };
                println!(
                    "{} {} into {}: {} loaded, {} duplicates, {} skipped",
                    marker,
                    source.file.display(),
                    source.module,
                    outcome.loaded,
                    outcome.duplicates,
                    outcome.skipped.total()
                );

                loaded += outcome.loaded;
                duplicates += outcome.duplicates;
                skipped += outcome.skipped.total();
            }
            Err(e) => {
                error!("Failed to load {}: {:#}", source.file.display(), e);
                println!("✗ Failed to load {}: {:#}", source.file.display(), e);
                failures += 1;
            }
        }
    }

    if loaded > 0 {
        database.optimize().await?;
    }

    println!();
    println!("Load summary:");
    println!("  Files processed: {} ({} failed)", sources.len(), failures);
    println!("  Chunks loaded: {}", loaded);
    println!("  Duplicates skipped: {}", duplicates);
    println!("  Records skipped: {}", skipped);

    Ok(())
}

/// Show catalog contents and row counts
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    let database = Database::connect(config)
        .await
        .context("Failed to connect to PostgreSQL")?;

    println!("📊 Docvec Catalog Status");
    println!("{}", "=".repeat(50));
    println!();
    println!(
        "🗄️  PostgreSQL: {} at {}:{}",
        config.database.dbname, config.database.host, config.database.port
    );
    println!();

    let counts = database
        .catalog_counts()
        .await
        .context("Failed to load catalog counts")?;

    if counts.is_empty() {
        println!("📭 The catalog is empty.");
        println!("Use 'docvec load --file <path> --module <name>' to ingest documentation.");
        return Ok(());
    }

    let overviews = database
        .module_overviews()
        .await
        .context("Failed to load module overview")?;

    println!("📚 Modules ({} total):", overviews.len());
    println!();

    for module in &overviews {
        println!("📦 {} ({} chunks)", module.display_label(), module.doc_count);
        println!("   Name: {}", module.name);
        println!(
            "   Embedding: {}",
            if module.has_embedding { "ready" } else { "missing" }
        );
        println!();
    }

    println!("Row counts:");
    println!("  Modules: {}", counts.modules);
    println!("  API doc chunks: {}", counts.api_docs);
    println!("  Actions: {}", counts.actions);
    println!("  Triggers: {}", counts.triggers);
    println!("  Connections: {}", counts.connections);
    println!("  Total: {}", counts.total());

    Ok(())
}

fn resolve_sources(
    config: &Config,
    file: Option<PathBuf>,
    module: Option<String>,
    label: Option<String>,
) -> Result<Vec<SourceEntry>> {
    match (file, module) {
        (Some(file), Some(module)) => Ok(vec![SourceEntry { file, module, label }]),
        (Some(_), None) => Err(anyhow::anyhow!("--module is required when --file is given")),
        (None, Some(_)) => Err(anyhow::anyhow!("--file is required when --module is given")),
        (None, None) => Ok(config.sources.clone()),
    }
}

// Attended terminals get a live byte bar; elsewhere progress goes to the log
// at each 10% boundary.
fn make_reporter() -> Box<dyn ProgressReporter> {
    if console::user_attended_stderr() {
        Box::new(BarProgress::new())
    } else {
        Box::new(DecileProgress::new(LogProgress))
    }
}
