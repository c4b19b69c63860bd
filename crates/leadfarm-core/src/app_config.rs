use std::path::PathBuf;

use crate::ConfigError;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub source_base_url: Option<String>,
    pub source_tag: String,
    pub data_dir: PathBuf,
    pub regions_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub page_size: u32,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub inter_request_delay_ms: u64,
    pub stall_threshold: u32,
    pub max_iterations: u32,
    pub checkpoint_every: usize,
    pub import_batch_size: usize,
    pub max_concurrent_sessions: usize,
}

impl AppConfig {
    /// The directory base URL, required by crawl commands.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `LEADFARM_SOURCE_BASE_URL`
    /// was not set.
    pub fn require_source_base_url(&self) -> Result<&str, ConfigError> {
        self.source_base_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("LEADFARM_SOURCE_BASE_URL".to_string()))
    }

    /// The database URL, required by store commands.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `DATABASE_URL` was not set.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("source_base_url", &self.source_base_url)
            .field("source_tag", &self.source_tag)
            .field("data_dir", &self.data_dir)
            .field("regions_path", &self.regions_path)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("page_size", &self.page_size)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("stall_threshold", &self.stall_threshold)
            .field("max_iterations", &self.max_iterations)
            .field("checkpoint_every", &self.checkpoint_every)
            .field("import_batch_size", &self.import_batch_size)
            .field("max_concurrent_sessions", &self.max_concurrent_sessions)
            .finish()
    }
}
