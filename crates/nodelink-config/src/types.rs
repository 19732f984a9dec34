//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use crate::defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub panel: PanelConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection to the management panel and per-node overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Panel base URL, e.g. `https://panel.example.com`.
    pub api_host: String,
    /// Shared secret sent in the `key` header.
    pub key: String,
    /// Numeric node id registered on the panel.
    pub node_id: u32,
    /// Node type: V2ray, Trojan or Shadowsocks.
    #[serde(default = "default_node_type")]
    pub node_type: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries for requests that fail before a response arrives.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// Use XTLS instead of TLS for nodes that need TLS.
    #[serde(default)]
    pub enable_xtls: bool,
    /// Serve VLESS instead of VMess on V2ray nodes.
    #[serde(default)]
    pub enable_vless: bool,
    /// Speed limit override in Mbps (0 = use the panel value).
    #[serde(default)]
    pub speed_limit: f64,
    /// Device limit override (0 = use the panel value).
    #[serde(default)]
    pub device_limit: u32,
    /// Local detection rule list, one regex per line.
    #[serde(default)]
    pub rule_list_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between node/user/rule polls.
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
    /// Seconds between status/online/traffic reports.
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: default_update_interval_secs(),
            report_interval_secs: default_report_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    pub level: Option<String>,
}
