use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub source_url: String,
    pub source_api_key: Option<String>,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub templates_path: PathBuf,
    pub source_timeout_secs: u64,
    pub source_max_retries: u32,
    pub source_backoff_base_ms: u64,
    pub validation_ttl_secs: u64,
    pub link_ttl_secs: u64,
    pub metrics_ttl_secs: u64,
    pub aggregate_ttl_secs: u64,
    pub cache_sweep_secs: u64,
    pub scheduler_tick_secs: u64,
    pub max_stored_reports: usize,
    pub link_check_urls: Vec<String>,
    pub link_check_cadence: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("source_url", &self.source_url)
            .field(
                "source_api_key",
                &self.source_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("templates_path", &self.templates_path)
            .field("source_timeout_secs", &self.source_timeout_secs)
            .field("source_max_retries", &self.source_max_retries)
            .field("source_backoff_base_ms", &self.source_backoff_base_ms)
            .field("validation_ttl_secs", &self.validation_ttl_secs)
            .field("link_ttl_secs", &self.link_ttl_secs)
            .field("metrics_ttl_secs", &self.metrics_ttl_secs)
            .field("aggregate_ttl_secs", &self.aggregate_ttl_secs)
            .field("cache_sweep_secs", &self.cache_sweep_secs)
            .field("scheduler_tick_secs", &self.scheduler_tick_secs)
            .field("max_stored_reports", &self.max_stored_reports)
            .field("link_check_urls", &self.link_check_urls)
            .field("link_check_cadence", &self.link_check_cadence)
            .finish()
    }
}
