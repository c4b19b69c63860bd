use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One crawlable city inside a region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityConfig {
    pub name: String,
    /// Region identifier the directory expects for this city's searches.
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    pub cities: Vec<CityConfig>,
}

impl RegionConfig {
    /// Generate a URL-safe slug from the region name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[derive(Debug, Deserialize)]
pub struct RegionsFile {
    pub regions: Vec<RegionConfig>,
}

impl RegionsFile {
    /// Look up a region by its slug.
    #[must_use]
    pub fn find(&self, slug: &str) -> Option<&RegionConfig> {
        self.regions.iter().find(|r| r.slug() == slug)
    }
}

/// Load and validate the regions configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_regions(path: &Path) -> Result<RegionsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RegionsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let regions_file: RegionsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::RegionsFileParse)?;

    validate_regions(&regions_file)?;

    Ok(regions_file)
}

fn validate_regions(regions_file: &RegionsFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for region in &regions_file.regions {
        if region.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "region name must be non-empty".to_string(),
            ));
        }

        let slug = region.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate region slug: '{}' (from region '{}')",
                slug, region.name
            )));
        }

        if region.cities.is_empty() {
            return Err(ConfigError::Validation(format!(
                "region '{}' has no cities",
                region.name
            )));
        }

        let mut seen_codes = HashSet::new();
        for city in &region.cities {
            if city.name.trim().is_empty() || city.code.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "region '{}' has a city with an empty name or code",
                    region.name
                )));
            }
            if !seen_codes.insert(city.code.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate city code '{}' in region '{}'",
                    city.code, region.name
                )));
            }
        }
    }

    Ok(())
}
