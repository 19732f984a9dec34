//! Configuration validation logic.

use nodelink_core::defaults::SUPPORTED_NODE_TYPES;

use crate::Config;
use crate::loader::ConfigError;

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let panel = &config.panel;
    if panel.api_host.trim().is_empty() {
        return Err(ConfigError::Validation("panel.api_host is empty".into()));
    }
    if !panel.api_host.starts_with("http://") && !panel.api_host.starts_with("https://") {
        return Err(ConfigError::Validation(
            "panel.api_host must start with http:// or https://".into(),
        ));
    }
    if panel.key.trim().is_empty() {
        return Err(ConfigError::Validation("panel.key is empty".into()));
    }
    if panel.node_id == 0 {
        return Err(ConfigError::Validation("panel.node_id must be > 0".into()));
    }
    let node_type = panel.node_type.to_ascii_lowercase();
    if !SUPPORTED_NODE_TYPES.contains(&node_type.as_str()) {
        return Err(ConfigError::Validation(format!(
            "panel.node_type must be one of V2ray, Trojan, Shadowsocks (got {:?})",
            panel.node_type
        )));
    }
    if panel.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "panel.timeout_secs must be > 0".into(),
        ));
    }
    if !panel.speed_limit.is_finite() || panel.speed_limit < 0.0 {
        return Err(ConfigError::Validation(
            "panel.speed_limit must be a non-negative number".into(),
        ));
    }
    if let Some(path) = &panel.rule_list_path
        && path.trim().is_empty()
    {
        return Err(ConfigError::Validation(
            "panel.rule_list_path is empty".into(),
        ));
    }
    if config.sync.update_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "sync.update_interval_secs must be > 0".into(),
        ));
    }
    if config.sync.report_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "sync.report_interval_secs must be > 0".into(),
        ));
    }
    Ok(())
}
