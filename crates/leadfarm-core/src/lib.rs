use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod interchange;
pub mod lead;
pub mod links;
pub mod phone;
pub mod regions;
pub mod resolver;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read regions file {path}: {source}")]
    RegionsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse regions file: {0}")]
    RegionsFileParse(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Validation(String),
}

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use interchange::{append_leads, read_leads, write_companies, InterchangeError};
pub use lead::{CanonicalCompany, ContactKind, RawLead};
pub use links::{classify_link, LinkClass};
pub use phone::{normalize_phone, NormalizedPhone};
pub use regions::{load_regions, CityConfig, RegionConfig, RegionsFile};
pub use resolver::{MergeSummary, Resolver};
