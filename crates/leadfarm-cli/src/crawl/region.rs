//! Multi-city region crawls.
//!
//! Expands a region from the regions file into one independent session per
//! city and runs them with bounded concurrency. Per-city failures are
//! reported and skipped; the command only fails when every city does.

use std::sync::atomic::AtomicBool;

use anyhow::Context;
use futures::stream::{self, StreamExt};

use leadfarm_core::{load_regions, AppConfig, CityConfig};
use leadfarm_scraper::{load_checkpoint, session_slug, DirectoryClient};

use super::runner::{run_session, SessionOutcome, SessionSpec};
use super::{build_directory_client, spawn_cancel_watch, starting_cursor};

#[derive(Clone, Copy)]
struct CityRunOptions {
    max_records: Option<u64>,
    scroll: bool,
    resume: bool,
}

/// Crawl one query across every city of a configured region.
///
/// Each city gets its own session, run file, and checkpoint; the city name
/// fills the output's `city` column. Sessions run concurrently up to
/// `max_concurrent_sessions`.
///
/// # Errors
///
/// Returns an error if the regions file cannot be loaded, the slug is
/// unknown, the client cannot be built, or every city fails.
pub(crate) async fn run_crawl_region(
    config: &AppConfig,
    region_slug: &str,
    query: &str,
    max_records: Option<u64>,
    scroll: bool,
    resume: bool,
) -> anyhow::Result<()> {
    let regions = load_regions(&config.regions_path).with_context(|| {
        format!(
            "failed to load regions from {}",
            config.regions_path.display()
        )
    })?;
    let region = regions.find(region_slug).ok_or_else(|| {
        anyhow::anyhow!(
            "region '{region_slug}' not found in {}",
            config.regions_path.display()
        )
    })?;

    let client = build_directory_client(config)?;
    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "failed to create data directory {}",
            config.data_dir.display()
        )
    })?;

    println!(
        "Crawling '{query}' across {} cities of {}...",
        region.cities.len(),
        region.name
    );

    let cancel = spawn_cancel_watch();
    let options = CityRunOptions {
        max_records,
        scroll,
        resume,
    };
    let max_concurrent = config.max_concurrent_sessions.max(1);

    let results: Vec<(&CityConfig, anyhow::Result<SessionOutcome>)> = stream::iter(&region.cities)
        .map(|city| {
            let fut = run_city_session(&client, config, city, query, options, &cancel);
            async move { (city, fut.await) }
        })
        .buffer_unordered(max_concurrent)
        .collect()
        .await;

    let mut total_accepted: u64 = 0;
    let mut total_processed: u64 = 0;
    let mut failed_cities: usize = 0;

    for (city, result) in &results {
        match result {
            Ok(outcome) => {
                total_accepted = total_accepted.saturating_add(outcome.accepted);
                total_processed = total_processed.saturating_add(outcome.processed);
                println!(
                    "  \u{2713} {:<20} {:>4} leads from {} listings  [{}]",
                    city.name, outcome.accepted, outcome.processed, outcome.stop
                );
            }
            Err(e) => {
                failed_cities += 1;
                println!("  \u{2717} {:<20} {e:#}", city.name);
            }
        }
    }

    let city_count = region.cities.len();
    if failed_cities > 0 {
        tracing::warn!(
            failed_cities,
            total_cities = city_count,
            "some cities failed during the crawl"
        );
    }
    if failed_cities == city_count {
        anyhow::bail!("all {failed_cities} cities failed");
    }

    println!(
        "Run complete: {total_accepted} leads from {total_processed} listings across {} cities",
        city_count - failed_cities
    );
    Ok(())
}

async fn run_city_session(
    client: &DirectoryClient,
    config: &AppConfig,
    city: &CityConfig,
    query: &str,
    options: CityRunOptions,
    cancel: &AtomicBool,
) -> anyhow::Result<SessionOutcome> {
    let slug = session_slug(&city.code, query);
    let checkpoint_path = config.data_dir.join(format!("{slug}.checkpoint.json"));
    let out_path = config.data_dir.join(format!("{slug}.csv"));

    // A region-wide `--resume` picks up whichever cities have a checkpoint
    // and starts the rest fresh; only an unreadable checkpoint fails a city.
    let (cursor, accepted_before) = if options.resume && checkpoint_path.exists() {
        let checkpoint = load_checkpoint(&checkpoint_path)
            .with_context(|| format!("cannot resume from {}", checkpoint_path.display()))?;
        (checkpoint.cursor, checkpoint.accepted)
    } else {
        if options.resume {
            tracing::warn!(city = %city.name, "no checkpoint found; starting fresh");
        }
        (starting_cursor(options.scroll), 0)
    };

    let spec = SessionSpec {
        region: city.code.clone(),
        query: query.to_string(),
        city: Some(city.name.clone()),
        out_path,
        checkpoint_path,
        cursor,
        accepted_before,
        max_records: options.max_records,
    };
    run_session(client, config, &spec, cancel).await
}
