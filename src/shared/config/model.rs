use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub zipper: ZipperConfig,
    pub broker: BrokerConfig,
    pub notify: NotifyConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Object store backend; only "fs" ships today.
    #[serde(default = "default_backend")]
    pub backend: String,
    pub fs_root: String,
    pub input_bucket: String,
    pub output_bucket: String,
}

fn default_backend() -> String {
    "fs".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    pub dir: String,
    #[serde(default = "default_cache_capacity_bytes")]
    pub capacity_bytes: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

fn default_cache_capacity_bytes() -> u64 {
    1024 * 1024 * 1024 // 1 GiB
}

fn default_max_attempts() -> u32 {
    4
}

fn default_retry_backoff_ms() -> u64 {
    250
}

fn default_download_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize)]
pub struct ZipperConfig {
    pub scratch_dir: String,
    pub max_parallel_jobs: usize,
    #[serde(default = "default_per_job_fanout")]
    pub per_job_fanout: usize,
    /// Hard ceiling on one job, acquisition through verification.
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
}

fn default_per_job_fanout() -> usize {
    8
}

fn default_job_timeout_secs() -> u64 {
    1800
}

#[derive(Debug, Deserialize)]
pub struct BrokerConfig {
    /// Must stay below the broker's base message deadline, or redelivery
    /// beats the first extension.
    #[serde(default = "default_extend_interval_secs")]
    pub extend_interval_secs: u64,
    pub max_extension_secs: u64,
}

fn default_extend_interval_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize)]
pub struct NotifyConfig {
    pub url: String,
    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_notify_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub tcp_addr: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

use std::env;

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let config_path = env::var("BUNDEL_CONFIG").unwrap_or_else(|_| "config".to_string());

    let settings: Settings = config::Config::builder()
        .add_source(config::File::with_name(&config_path))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
