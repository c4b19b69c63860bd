//! Crawl command handlers for the CLI.
//!
//! `run` drives a single region+query session; `run-region` fans the same
//! session out across every city of a configured region. Both write
//! checkpointed run CSVs under the data directory and always print a final
//! summary, even when a session ends early.

mod region;
mod runner;

pub(crate) use region::run_crawl_region;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;

use leadfarm_core::AppConfig;
use leadfarm_scraper::{load_checkpoint, session_slug, Cursor, DirectoryClient};

use runner::{run_session, SessionOutcome, SessionSpec};

/// Crawl a single region for one query.
///
/// # Errors
///
/// Returns an error when the session cannot be established: missing base
/// URL, an unusable data directory, an unreadable checkpoint on `--resume`,
/// or a search failure before the first window. Everything after that point
/// ends the run gracefully with a summary.
pub(crate) async fn run_crawl(
    config: &AppConfig,
    region: &str,
    query: &str,
    max_records: Option<u64>,
    scroll: bool,
    resume: bool,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let client = build_directory_client(config)?;

    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "failed to create data directory {}",
            config.data_dir.display()
        )
    })?;

    let slug = session_slug(region, query);
    let checkpoint_path = config.data_dir.join(format!("{slug}.checkpoint.json"));
    let out_path = out.unwrap_or_else(|| config.data_dir.join(format!("{slug}.csv")));

    let (cursor, accepted_before) = if resume {
        let checkpoint = load_checkpoint(&checkpoint_path)
            .with_context(|| format!("cannot resume from {}", checkpoint_path.display()))?;
        println!(
            "Resuming '{query}' in {region} from {} ({} leads collected so far)",
            describe_cursor(checkpoint.cursor),
            checkpoint.accepted
        );
        (checkpoint.cursor, checkpoint.accepted)
    } else {
        (starting_cursor(scroll), 0)
    };

    let spec = SessionSpec {
        region: region.to_string(),
        query: query.to_string(),
        city: None,
        out_path,
        checkpoint_path,
        cursor,
        accepted_before,
        max_records,
    };

    let cancel = spawn_cancel_watch();
    let outcome = run_session(&client, config, &spec, &cancel).await?;
    print_session_summary(&spec, &outcome);
    Ok(())
}

/// Build the production directory client from configuration.
pub(crate) fn build_directory_client(config: &AppConfig) -> anyhow::Result<DirectoryClient> {
    let base_url = config.require_source_base_url()?;
    DirectoryClient::new(
        base_url,
        config.request_timeout_secs,
        &config.user_agent,
        config.page_size,
        config.max_retries,
        config.retry_backoff_base_secs,
    )
    .map_err(|e| anyhow::anyhow!("failed to build directory client: {e}"))
}

fn starting_cursor(scroll: bool) -> Cursor {
    if scroll {
        Cursor::scroll_start()
    } else {
        Cursor::first_page()
    }
}

fn describe_cursor(cursor: Cursor) -> String {
    match cursor {
        Cursor::Page(page) => format!("page {page}"),
        Cursor::Offset(offset) => format!("offset {offset}"),
    }
}

/// Flip a shared flag on Ctrl-C. Sessions poll it between listing visits,
/// so the current listing finishes and the batch flushes before exit.
fn spawn_cancel_watch() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; flushing after the current listing");
            flag.store(true, Ordering::SeqCst);
        }
    });
    cancel
}

fn print_session_summary(spec: &SessionSpec, outcome: &SessionOutcome) {
    println!(
        "Run complete [{}]: {} leads accepted from {} listings across {} pages",
        outcome.stop, outcome.accepted, outcome.processed, outcome.pages
    );
    println!(
        "  duplicates {}, no-phone {}, website {}, unnamed {}, failed visits {}",
        outcome.duplicates,
        outcome.rejected_no_phone,
        outcome.rejected_website,
        outcome.rejected_unnamed,
        outcome.failed_visits
    );
    println!("  wrote {}", spec.out_path.display());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[path = "crawl_test.rs"]
mod tests;
