//! Text-dump command: pasted directory pages into a run CSV.

use std::path::{Path, PathBuf};

use anyhow::Context;

use leadfarm_core::append_leads;
use leadfarm_scraper::{extract_lead, parse_text_dump, Rejection};

/// Extract leads from a free-text directory dump.
///
/// A lower-fidelity alternate front-end: listing blocks are recovered with
/// regex heuristics and fed through the same extractor and CSV writer the
/// crawl uses. Output defaults to the input path with a `.csv` extension
/// and is appended to, so several dumps can build up one run file.
///
/// # Errors
///
/// Returns an error if the input cannot be read or the output cannot be
/// written.
pub(crate) fn run_parse_text(file: &Path, out: Option<PathBuf>) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let details = parse_text_dump(&text);
    if details.is_empty() {
        println!("no listing blocks found in {}", file.display());
        return Ok(());
    }

    let out_path = out.unwrap_or_else(|| file.with_extension("csv"));

    let mut leads = Vec::new();
    let mut rejected_no_phone = 0u64;
    let mut rejected_website = 0u64;
    let mut rejected_unnamed = 0u64;

    for detail in &details {
        match extract_lead(detail, None) {
            Ok(lead) => leads.push(lead),
            Err(Rejection::NoUsablePhone) => rejected_no_phone += 1,
            Err(Rejection::ExternalWebsite) => rejected_website += 1,
            Err(Rejection::EmptyName) => rejected_unnamed += 1,
        }
    }

    append_leads(&out_path, &leads, false)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    println!(
        "Parsed {} blocks: {} leads accepted ({} without a phone, {} with a website, {} unnamed)",
        details.len(),
        leads.len(),
        rejected_no_phone,
        rejected_website,
        rejected_unnamed
    );
    println!("  wrote {}", out_path.display());
    Ok(())
}
