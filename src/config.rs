// src/config.rs
//! Configuration for solana-pulse
//!
//! Layered lowest to highest priority: built-in defaults, an optional JSON
//! file, environment variables, then command-line flags (applied by the
//! binary).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analytics::EngineConfig;
use crate::error_handling::{PulseError, PulseResult};
use crate::monitoring::MonitorConfig;
use crate::source::RpcDataSourceConfig;

/// Environment variable overriding the RPC endpoint
pub const ENV_RPC_URL: &str = "SOLANA_RPC_URL";

/// Environment variable overriding the block window
pub const ENV_BLOCK_WINDOW: &str = "PULSE_BLOCK_WINDOW";

/// Environment variable overriding the poll interval
pub const ENV_POLL_INTERVAL: &str = "PULSE_POLL_INTERVAL_SECS";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PulseConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,

    /// Blocks sampled per snapshot, for both `snapshot` and `watch`
    pub block_window: usize,

    /// Seconds between snapshots in watch mode
    pub poll_interval_secs: u64,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Performance samples averaged into the TPS estimate
    pub performance_samples: usize,

    /// Maximum number of block requests in flight at once
    pub max_concurrent_requests: usize,

    /// Analytics engine settings
    pub engine: EngineConfig,
}

impl Default for PulseConfig {
    fn default() -> Self {
        let rpc = RpcDataSourceConfig::default();
        let monitor = MonitorConfig::default();
        Self {
            rpc_url: rpc.url,
            block_window: monitor.block_window,
            poll_interval_secs: monitor.interval_secs,
            request_timeout_secs: rpc.timeout_secs,
            performance_samples: rpc.performance_samples,
            max_concurrent_requests: rpc.max_concurrent_requests,
            engine: EngineConfig::default(),
        }
    }
}

impl PulseConfig {
    /// Load a configuration file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> PulseResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> PulseResult<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_vars<F>(&mut self, lookup: F) -> PulseResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc_url = url;
        }
        if let Some(window) = lookup(ENV_BLOCK_WINDOW) {
            self.block_window = parse_var(ENV_BLOCK_WINDOW, &window)?;
        }
        if let Some(interval) = lookup(ENV_POLL_INTERVAL) {
            self.poll_interval_secs = parse_var(ENV_POLL_INTERVAL, &interval)?;
        }
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> PulseResult<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(PulseError::Configuration("rpc_url must not be empty".to_string()));
        }
        if self.block_window == 0 {
            return Err(PulseError::Configuration("block_window must be positive".to_string()));
        }
        if self.max_concurrent_requests == 0 {
            return Err(PulseError::Configuration("max_concurrent_requests must be positive".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(PulseError::Configuration("poll_interval_secs must be positive".to_string()));
        }
        if self.engine.history_capacity == 0 {
            return Err(PulseError::Configuration("engine.history_capacity must be positive".to_string()));
        }
        if !(self.engine.smoothing_factor > 0.0 && self.engine.smoothing_factor <= 1.0) {
            return Err(PulseError::Configuration(format!(
                "engine.smoothing_factor must be in (0, 1], got {}",
                self.engine.smoothing_factor
            )));
        }
        Ok(())
    }

    /// RPC data source settings
    pub fn rpc_config(&self) -> RpcDataSourceConfig {
        RpcDataSourceConfig {
            url: self.rpc_url.clone(),
            timeout_secs: self.request_timeout_secs,
            performance_samples: self.performance_samples,
            max_concurrent_requests: self.max_concurrent_requests,
        }
    }

    /// Monitor settings
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            interval_secs: self.poll_interval_secs,
            block_window: self.block_window,
            ..MonitorConfig::default()
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> PulseResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PulseError::Configuration(format!("{} has invalid value {:?}", key, value)))
}
