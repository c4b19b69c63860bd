//! Import command: merged company CSV into the leads store.

use std::path::Path;

use anyhow::Context;

use leadfarm_core::{read_leads, AppConfig, Resolver};
use leadfarm_db::{connect_pool, import_companies, PoolConfig};

/// Import a merged company CSV into the `leads` table.
///
/// The file is re-resolved before import, so hand-edited or concatenated
/// files still dedup correctly. With `--dry-run` the command prints what
/// would happen and never touches the database.
///
/// # Errors
///
/// Returns an error if the file cannot be read, `DATABASE_URL` is not set,
/// or the import itself fails.
pub(crate) async fn run_import(
    config: &AppConfig,
    file: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let (leads, skipped_rows) =
        read_leads(file).with_context(|| format!("failed to read {}", file.display()))?;
    if skipped_rows > 0 {
        tracing::warn!(skipped_rows, file = %file.display(), "dropped unusable rows while reading");
    }

    let mut resolver = Resolver::new();
    resolver.absorb_all(leads);
    let (companies, summary) = resolver.finish();

    if companies.is_empty() {
        println!("no importable companies in {}", file.display());
        return Ok(());
    }

    let batch_size = config.import_batch_size.max(1);
    if dry_run {
        let batches = companies.len().div_ceil(batch_size);
        println!(
            "dry-run: would import {} companies from {} records in {} batch(es) of up to {}",
            companies.len(),
            summary.records_in,
            batches,
            batch_size
        );
        return Ok(());
    }

    let database_url = config.require_database_url()?;
    let pool = connect_pool(database_url, PoolConfig::from_app_config(config))
        .await
        .context("failed to connect to the database")?;

    let outcome = import_companies(&pool, &companies, batch_size, &config.source_tag).await?;
    println!(
        "Imported {} companies, skipped {} already claimed",
        outcome.inserted, outcome.skipped_existing
    );
    Ok(())
}
