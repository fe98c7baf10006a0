//! Configuration for the MCP gateway.

use std::path::PathBuf;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure, loaded once at startup and shared read-only.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backends: BackendsConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub adapters: AdaptersConfig,
    #[serde(default)]
    pub zeopp: ZeoppConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
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

/// Base address of each compute backend.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendsConfig {
    /// MACE neural-network-potential optimizer.
    #[serde(default = "default_maceopt_url")]
    pub maceopt: String,
    /// Zeo++ porous-structure analysis.
    #[serde(default = "default_zeopp_url")]
    pub zeopp: String,
    /// xTB semi-empirical optimizer.
    #[serde(default = "default_xtb_url")]
    pub xtb: String,
}

impl BackendsConfig {
    /// `(model key, base URL)` pairs for every configured backend.
    pub fn entries(&self) -> [(&'static str, &str); 3] {
        [
            ("maceopt", self.maceopt.as_str()),
            ("zeopp", self.zeopp.as_str()),
            ("xtb", self.xtb.as_str()),
        ]
    }
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            maceopt: default_maceopt_url(),
            zeopp: default_zeopp_url(),
            xtb: default_xtb_url(),
        }
    }
}

/// Job queue and worker pool settings.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Number of parallel workers executing backend calls.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Maximum number of jobs waiting for a worker.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Drop terminal job records older than this. Records are kept forever when unset.
    #[serde(default)]
    pub result_ttl_secs: Option<u64>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            capacity: default_capacity(),
            result_ttl_secs: None,
        }
    }
}

/// Settings shared by every backend adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct AdaptersConfig {
    /// Timeout for a single backend call.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
    /// Directory for temporary structure files (system temp dir when unset).
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for AdaptersConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout(),
            scratch_dir: None,
        }
    }
}

/// Zeo++ adapter settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ZeoppConfig {
    /// JSON file mapping route name to its required and optional parameters.
    #[serde(default = "default_routes_file")]
    pub routes_file: PathBuf,
    /// Route used when a request does not name one.
    #[serde(default = "default_route")]
    pub default_route: String,
}

impl Default for ZeoppConfig {
    fn default() -> Self {
        Self {
            routes_file: default_routes_file(),
            default_route: default_route(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_maceopt_url() -> String {
    "http://maceopt:4748".to_string()
}
fn default_zeopp_url() -> String {
    "http://zeopp:8000".to_string()
}
fn default_xtb_url() -> String {
    "http://xtbopt:8000".to_string()
}
fn default_workers() -> usize {
    4
}
fn default_capacity() -> usize {
    1024
}
fn default_call_timeout() -> u64 {
    60
}
fn default_routes_file() -> PathBuf {
    PathBuf::from("config/zeopp_routes.json")
}
fn default_route() -> String {
    "pore_diameter".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (MCP__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("queue.workers", default_workers() as i64)?
            .set_default("adapters.call_timeout_secs", default_call_timeout() as i64)?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("MCP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
