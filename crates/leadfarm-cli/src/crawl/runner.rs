//! The single-session crawl loop: navigator window → detail visit →
//! extraction → periodic checkpoint flush.
//!
//! Failed detail visits and rejected listings are counted and skipped.
//! Only two things abort a session: a search failure before the first
//! window arrives, and an I/O failure on the run's own files. A search
//! failure later in the run ends it gracefully, flushing what was
//! collected.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;

use leadfarm_core::{append_leads, AppConfig, RawLead};
use leadfarm_scraper::{
    extract_lead, save_checkpoint, CrawlCheckpoint, Cursor, ListingSource, Navigator,
    NavigatorConfig, Rejection, StopReason,
};

/// Everything that identifies one crawl session and where it writes.
pub(crate) struct SessionSpec {
    /// Region code passed to the source with every search.
    pub region: String,
    pub query: String,
    /// City name stored in the output's `city` column; also switches the
    /// run file to the 5-column shape.
    pub city: Option<String>,
    pub out_path: std::path::PathBuf,
    pub checkpoint_path: std::path::PathBuf,
    pub cursor: Cursor,
    /// Leads accepted by earlier runs of this session, from the checkpoint.
    pub accepted_before: u64,
    /// Cap on leads accepted by this invocation, not the session lifetime.
    pub max_records: Option<u64>,
}

/// Counters for one session, reported in the final summary.
#[derive(Debug, Default)]
pub(crate) struct SessionOutcome {
    pub pages: u32,
    pub processed: u64,
    pub accepted: u64,
    pub duplicates: u64,
    pub rejected_no_phone: u64,
    pub rejected_website: u64,
    pub rejected_unnamed: u64,
    pub failed_visits: u64,
    /// Why the session stopped, e.g. "done", "stalled", "cancelled".
    pub stop: &'static str,
}

/// Drive one crawl session to completion.
///
/// # Errors
///
/// Returns an error if the first search window cannot be fetched or a
/// flush to the run file or checkpoint fails. Per-listing failures are
/// counted in the outcome instead.
pub(crate) async fn run_session<S: ListingSource + ?Sized>(
    source: &S,
    config: &AppConfig,
    spec: &SessionSpec,
    cancel: &AtomicBool,
) -> anyhow::Result<SessionOutcome> {
    let nav_config = NavigatorConfig {
        stall_threshold: config.stall_threshold,
        max_iterations: config.max_iterations,
    };
    let mut navigator = Navigator::new(source, &spec.query, &spec.region, spec.cursor, nav_config);

    let mut outcome = SessionOutcome::default();
    let mut pending: Vec<RawLead> = Vec::new();
    let mut seen_phones: HashSet<String> = HashSet::new();
    let checkpoint_every = config.checkpoint_every.max(1);
    let delay = Duration::from_millis(config.inter_request_delay_ms);
    let mut established = false;

    'crawl: loop {
        if cancel.load(Ordering::SeqCst) {
            outcome.stop = "cancelled";
            break;
        }
        if reached_cap(&outcome, spec) {
            outcome.stop = "record limit";
            break;
        }

        let handles = match navigator.next_batch().await {
            Ok(Some(handles)) => handles,
            Ok(None) => {
                outcome.stop = navigator.stop_reason().map_or("done", StopReason::label);
                break;
            }
            Err(e) if !established => {
                return Err(e).with_context(|| {
                    format!(
                        "could not establish session for '{}' in {}",
                        spec.query, spec.region
                    )
                });
            }
            Err(e) => {
                tracing::error!(
                    query = %spec.query,
                    region = %spec.region,
                    error = %e,
                    "search failed mid-run; ending session"
                );
                outcome.stop = "search failed";
                break;
            }
        };
        established = true;

        for handle in handles {
            if cancel.load(Ordering::SeqCst) {
                outcome.stop = "cancelled";
                break 'crawl;
            }
            if reached_cap(&outcome, spec) {
                outcome.stop = "record limit";
                break 'crawl;
            }

            let detail = match source.fetch_detail(&handle).await {
                Ok(detail) => detail,
                Err(e) => {
                    tracing::warn!(listing = %handle.id, error = %e, "detail visit failed; skipping");
                    outcome.failed_visits += 1;
                    continue;
                }
            };
            outcome.processed += 1;

            match extract_lead(&detail, spec.city.as_deref()) {
                Ok(lead) => {
                    if lead.phones.iter().all(|p| seen_phones.contains(p.as_str())) {
                        outcome.duplicates += 1;
                    } else {
                        for phone in &lead.phones {
                            seen_phones.insert(phone.as_str().to_owned());
                        }
                        pending.push(lead);
                        outcome.accepted += 1;
                    }
                }
                Err(Rejection::NoUsablePhone) => outcome.rejected_no_phone += 1,
                Err(Rejection::ExternalWebsite) => outcome.rejected_website += 1,
                Err(Rejection::EmptyName) => outcome.rejected_unnamed += 1,
            }

            if pending.len() >= checkpoint_every {
                flush(spec, &mut pending, navigator.cursor(), outcome.accepted)?;
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        tracing::info!(
            query = %spec.query,
            region = %spec.region,
            pages = navigator.iterations(),
            processed = outcome.processed,
            accepted = outcome.accepted,
            duplicates = outcome.duplicates,
            "window complete"
        );
    }

    flush(spec, &mut pending, navigator.cursor(), outcome.accepted)?;
    outcome.pages = navigator.iterations();
    Ok(outcome)
}

fn reached_cap(outcome: &SessionOutcome, spec: &SessionSpec) -> bool {
    spec.max_records
        .is_some_and(|cap| outcome.accepted >= cap)
}

/// Append pending leads, then rewrite the checkpoint.
///
/// Ordering matters: the CSV append happens first, and the batch is only
/// cleared after it succeeds, so a failure at either step leaves the
/// accumulated leads and the previous checkpoint intact.
fn flush(
    spec: &SessionSpec,
    pending: &mut Vec<RawLead>,
    cursor: Cursor,
    accepted_this_run: u64,
) -> anyhow::Result<()> {
    if !pending.is_empty() {
        append_leads(&spec.out_path, pending, spec.city.is_some())
            .with_context(|| format!("failed to append leads to {}", spec.out_path.display()))?;
        pending.clear();
    }

    let checkpoint = CrawlCheckpoint {
        region: spec.region.clone(),
        query: spec.query.clone(),
        cursor,
        accepted: spec.accepted_before.saturating_add(accepted_this_run),
        updated_at: Utc::now(),
    };
    save_checkpoint(&spec.checkpoint_path, &checkpoint).with_context(|| {
        format!(
            "failed to write checkpoint {}",
            spec.checkpoint_path.display()
        )
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
