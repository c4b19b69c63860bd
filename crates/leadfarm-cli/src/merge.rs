//! Merge command: many run CSVs into one canonical company file.

use std::path::{Path, PathBuf};

use anyhow::Context;

use leadfarm_core::{read_leads, write_companies, Resolver};

/// Merge run files into a single canonical company CSV.
///
/// Inputs are processed in sorted-path order so the same set of files
/// always produces the same output, regardless of shell glob order.
///
/// # Errors
///
/// Returns an error if any input cannot be read or the output cannot be
/// written.
pub(crate) fn run_merge(files: &[PathBuf], out: &Path) -> anyhow::Result<()> {
    let mut paths: Vec<&PathBuf> = files.iter().collect();
    paths.sort();

    let mut resolver = Resolver::new();
    let mut unusable_rows = 0usize;

    for path in paths {
        let (leads, skipped) =
            read_leads(path).with_context(|| format!("failed to read {}", path.display()))?;
        tracing::info!(file = %path.display(), leads = leads.len(), skipped, "absorbed run file");
        unusable_rows += skipped;
        resolver.absorb_all(leads);
    }

    let (companies, summary) = resolver.finish();
    write_companies(out, &companies)
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!(
        "Merged {} records into {} companies ({} phone collisions, {} leads skipped)",
        summary.records_in, summary.companies_out, summary.phone_collisions, summary.skipped_leads
    );
    if unusable_rows > 0 {
        println!("  {unusable_rows} unusable rows dropped while reading");
    }
    println!("  wrote {}", out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn merges_runs_and_joins_companies_on_shared_phones() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("krasnodar_remont.csv");
        let second = dir.path().join("sochi_remont.csv");
        let out = dir.path().join("merged.csv");

        std::fs::write(
            &first,
            "name,phones,social,source_url\n\
             Alpha,\"+79990000001,+79990000002\",VK,https://d/firm/1\n\
             Beta,+79990000003,,https://d/firm/2\n",
        )
        .unwrap();
        // Shares a phone with Alpha under a different identity key.
        std::fs::write(
            &second,
            "name,phones,social,source_url\n\
             Alpha South,+79990000002,Telegram,https://d/firm/9\n",
        )
        .unwrap();

        run_merge(&[first, second], &out).unwrap();

        let (merged, _) = read_leads(&out).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].display_name, "Alpha");
        let phones: Vec<&str> = merged[0].phones.iter().map(AsRef::as_ref).collect();
        assert_eq!(phones, vec!["+79990000001", "+79990000002"]);
        assert!(merged[0].social_labels.contains("VK"));
        assert!(merged[0].social_labels.contains("Telegram"));
        assert_eq!(merged[1].display_name, "Beta");
    }

    #[test]
    fn input_order_does_not_change_the_output() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");

        std::fs::write(
            &a,
            "name,phones,social,source_url\nFirst,+79990000001,,\n",
        )
        .unwrap();
        std::fs::write(
            &b,
            "name,phones,social,source_url\nSecond,+79990000002,,\n",
        )
        .unwrap();

        let out_forward = dir.path().join("forward.csv");
        let out_reverse = dir.path().join("reverse.csv");
        run_merge(&[a.clone(), b.clone()], &out_forward).unwrap();
        run_merge(&[b, a], &out_reverse).unwrap();

        let forward = std::fs::read_to_string(&out_forward).unwrap();
        let reverse = std::fs::read_to_string(&out_reverse).unwrap();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.csv");
        let out = dir.path().join("merged.csv");

        let err = run_merge(&[missing.clone()], &out).unwrap_err();
        assert!(format!("{err:#}").contains("nope.csv"));
    }
}
