//! CSV interchange files shared by the crawl, merge, and import commands.
//!
//! Layout is positional: `name,phones,social,source_url` with an optional
//! trailing `city` column. Multi-valued fields are comma-joined inside one
//! CSV field and re-split on read.

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::path::Path;

use chrono::Utc;
use thiserror::Error;

use crate::lead::{CanonicalCompany, RawLead};
use crate::phone::{normalize_phone, NormalizedPhone};

#[derive(Debug, Error)]
pub enum InterchangeError {
    #[error("failed to access interchange file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

const BASE_HEADER: [&str; 4] = ["name", "phones", "social", "source_url"];
const CITY_HEADER: [&str; 5] = ["name", "phones", "social", "source_url", "city"];

/// Append leads to a run file, writing the header only when the file is new
/// or empty. `with_city` must stay constant for the lifetime of one file.
///
/// # Errors
///
/// Returns `InterchangeError` if the file cannot be opened or written.
pub fn append_leads(
    path: &Path,
    leads: &[RawLead],
    with_city: bool,
) -> Result<(), InterchangeError> {
    let needs_header = match std::fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| InterchangeError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if needs_header {
        if with_city {
            writer.write_record(CITY_HEADER)?;
        } else {
            writer.write_record(BASE_HEADER)?;
        }
    }

    for lead in leads {
        let phones = join_phones(&lead.phones);
        let social = join_labels(&lead.social_labels);
        let source_url = lead.source_url.as_deref().unwrap_or_default();
        if with_city {
            let city = lead.city.as_deref().unwrap_or_default();
            writer.write_record([
                lead.display_name.as_str(),
                &phones,
                &social,
                source_url,
                city,
            ])?;
        } else {
            writer.write_record([lead.display_name.as_str(), &phones, &social, source_url])?;
        }
    }

    writer.flush().map_err(|e| InterchangeError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

/// Write merged companies to a fresh interchange file, replacing any
/// previous content. The `city` column appears when at least one company
/// has a city.
///
/// # Errors
///
/// Returns `InterchangeError` if the file cannot be created or written.
pub fn write_companies(
    path: &Path,
    companies: &[CanonicalCompany],
) -> Result<(), InterchangeError> {
    let with_city = companies.iter().any(|c| c.city.is_some());

    let file = File::create(path).map_err(|e| InterchangeError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if with_city {
        writer.write_record(CITY_HEADER)?;
    } else {
        writer.write_record(BASE_HEADER)?;
    }

    for company in companies {
        let phones = join_phones(&company.phones);
        let social = join_labels(&company.social_labels);
        let source_url = company.source_url.as_deref().unwrap_or_default();
        if with_city {
            let city = company.city.as_deref().unwrap_or_default();
            writer.write_record([
                company.display_name.as_str(),
                &phones,
                &social,
                source_url,
                city,
            ])?;
        } else {
            writer.write_record([company.display_name.as_str(), &phones, &social, source_url])?;
        }
    }

    writer.flush().map_err(|e| InterchangeError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

/// Read leads back from an interchange file.
///
/// Every phone is re-normalized on the way in, so files touched by hand or
/// produced by older runs still come back canonical. Rows with no usable
/// name or phone are dropped and counted, not failed.
///
/// # Errors
///
/// Returns `InterchangeError` if the file cannot be opened or a record is
/// not valid CSV.
pub fn read_leads(path: &Path) -> Result<(Vec<RawLead>, usize), InterchangeError> {
    let file = File::open(path).map_err(|e| InterchangeError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let has_city = reader
        .headers()?
        .iter()
        .any(|h| h.trim().eq_ignore_ascii_case("city"));

    let mut leads = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record?;
        let display_name = record.get(0).unwrap_or_default().trim().to_string();
        let phones = split_phones(record.get(1).unwrap_or_default());

        if display_name.is_empty() || phones.is_empty() {
            skipped += 1;
            continue;
        }

        let social_labels: BTreeSet<String> = record
            .get(2)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        let source_url = non_empty(record.get(3));
        let city = if has_city {
            non_empty(record.get(4))
        } else {
            None
        };

        leads.push(RawLead {
            display_name,
            phones,
            social_labels,
            source_url,
            city,
            has_external_website: false,
            extracted_at: Utc::now(),
        });
    }

    Ok((leads, skipped))
}

fn join_phones(phones: &[NormalizedPhone]) -> String {
    phones
        .iter()
        .map(NormalizedPhone::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn join_labels(labels: &BTreeSet<String>) -> String {
    labels.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

fn split_phones(field: &str) -> Vec<NormalizedPhone> {
    let mut phones = Vec::new();
    for part in field.split(',') {
        if let Some(phone) = normalize_phone(part) {
            if !phones.contains(&phone) {
                phones.push(phone);
            }
        }
    }
    phones
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
