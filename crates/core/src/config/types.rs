use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote catalog endpoints, credentials and pacing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Bulk search endpoint (POST, JSON body)
    #[serde(default = "default_search_url")]
    pub search_url: String,
    /// Base URL of the per-series detail API
    #[serde(default = "default_detail_base_url")]
    pub detail_base_url: String,
    /// Base URL used to derive canonical series URLs
    #[serde(default = "default_site_base_url")]
    pub site_base_url: String,
    /// Search engine key, sent in the bulk search body
    pub engine_key: String,
    /// Consumer key, sent as a header on detail requests only
    pub consumer_key: String,
    /// Records requested per search page (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Per-request timeout in seconds (default: 60)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Backoff before the single retry after a network failure (default: 30s)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Minimum spacing between requests to the same endpoint (default: 50ms)
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,
}

fn default_search_url() -> String {
    "https://search.dcuniverseinfinite.com/api/v1/public/engines/search.json".to_string()
}

fn default_detail_base_url() -> String {
    "https://www.dcuniverseinfinite.com".to_string()
}

fn default_site_base_url() -> String {
    "https://www.dcuniverseinfinite.com".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_request_timeout() -> u64 {
    60
}

fn default_retry_delay() -> u64 {
    30_000
}

fn default_request_delay() -> u64 {
    50
}

impl RemoteConfig {
    /// Remote config with default endpoints and pacing, for the given credentials.
    pub fn with_keys(engine_key: impl Into<String>, consumer_key: impl Into<String>) -> Self {
        Self {
            search_url: default_search_url(),
            detail_base_url: default_detail_base_url(),
            site_base_url: default_site_base_url(),
            engine_key: engine_key.into(),
            consumer_key: consumer_key.into(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout(),
            retry_delay_ms: default_retry_delay(),
            request_delay_ms: default_request_delay(),
        }
    }
}

/// What happens to genre/imprint pairs that a later sync no longer reports
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelationPolicy {
    /// Insert newly seen pairs, never delete (default)
    #[default]
    Accumulate,
    /// Delete the series' pairs and insert the reported set, in the same transaction
    Replace,
}

/// Sync cycle behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Stored rows not refreshed within this many days are flagged (default: 365)
    #[serde(default = "default_staleness_days")]
    pub staleness_days: u32,
    #[serde(default)]
    pub relation_policy: RelationPolicy,
    /// Start one cycle as soon as the server is up
    #[serde(default)]
    pub run_on_start: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            staleness_days: default_staleness_days(),
            relation_policy: RelationPolicy::default(),
            run_on_start: false,
        }
    }
}

fn default_staleness_days() -> u32 {
    365
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("mirror.db")
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub remote: SanitizedRemoteConfig,
    pub sync: SyncConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

/// Remote config with both keys hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRemoteConfig {
    pub search_url: String,
    pub detail_base_url: String,
    pub engine_key_configured: bool,
    pub consumer_key_configured: bool,
    pub page_size: u32,
    pub request_delay_ms: u64,
    pub retry_delay_ms: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            remote: SanitizedRemoteConfig {
                search_url: config.remote.search_url.clone(),
                detail_base_url: config.remote.detail_base_url.clone(),
                engine_key_configured: !config.remote.engine_key.is_empty(),
                consumer_key_configured: !config.remote.consumer_key.is_empty(),
                page_size: config.remote.page_size,
                request_delay_ms: config.remote.request_delay_ms,
                retry_delay_ms: config.remote.retry_delay_ms,
            },
            sync: config.sync.clone(),
            database: config.database.clone(),
            server: config.server.clone(),
        }
    }
}
