//! CLI override definitions and application logic.

use clap::Parser;

use crate::Config;

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Override panel base URL, e.g. https://panel.example.com
    #[arg(long)]
    pub api_host: Option<String>,
    /// Override panel shared secret
    #[arg(long)]
    pub key: Option<String>,
    /// Override node id
    #[arg(long)]
    pub node_id: Option<u32>,
    /// Override node type (V2ray, Trojan, Shadowsocks)
    #[arg(long)]
    pub node_type: Option<String>,
    /// Override request timeout (seconds)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    /// Override poll interval (seconds)
    #[arg(long)]
    pub update_interval_secs: Option<u64>,
    /// Override report interval (seconds)
    #[arg(long)]
    pub report_interval_secs: Option<u64>,
    /// Override local rule list path
    #[arg(long)]
    pub rule_list_path: Option<String>,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    if let Some(v) = &overrides.api_host {
        config.panel.api_host = v.clone();
    }
    if let Some(v) = &overrides.key {
        config.panel.key = v.clone();
    }
    if let Some(v) = overrides.node_id {
        config.panel.node_id = v;
    }
    if let Some(v) = &overrides.node_type {
        config.panel.node_type = v.clone();
    }
    if let Some(v) = overrides.timeout_secs {
        config.panel.timeout_secs = v;
    }
    if let Some(v) = overrides.update_interval_secs {
        config.sync.update_interval_secs = v;
    }
    if let Some(v) = overrides.report_interval_secs {
        config.sync.report_interval_secs = v;
    }
    if let Some(v) = &overrides.rule_list_path {
        config.panel.rule_list_path = Some(v.clone());
    }
    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
}
