//! Wire types (must match the panel's JSON exactly).
//!
//! Responses are decoded in two steps: first into [`Envelope`] with an
//! untyped `data` field, then the adapter for the node type decodes `data`
//! into one of the payload structs below.

use serde::{Deserialize, Serialize};

/// Outer response envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

// ── Node info ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct V2rayNodeInfo {
    pub v2_port: u32,
    #[serde(default)]
    pub v2_alter_id: u16,
    #[serde(default)]
    pub v2_net: String,
    #[serde(default)]
    pub v2_type: String,
    #[serde(default)]
    pub v2_host: String,
    #[serde(default)]
    pub v2_path: String,
    #[serde(default)]
    pub v2_tls: bool,
    #[serde(default)]
    pub speed_limit: u64,
    #[serde(default)]
    pub client_limit: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrojanNodeInfo {
    pub trojan_port: u32,
    #[serde(default)]
    pub speed_limit: u64,
    #[serde(default)]
    pub client_limit: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShadowsocksNodeInfo {
    pub port: u32,
    pub method: String,
    #[serde(default)]
    pub speed_limit: u64,
    #[serde(default)]
    pub client_limit: u32,
}

// ── User lists ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct VmessUser {
    pub uid: u32,
    pub vmess_uid: String,
    #[serde(default)]
    pub speed_limit: u64,
    #[serde(default)]
    pub device_limit: u32,
    #[serde(default)]
    pub online_count: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrojanUser {
    pub uid: u32,
    pub password: String,
    #[serde(default)]
    pub speed_limit: u64,
    #[serde(default)]
    pub device_limit: u32,
    #[serde(default)]
    pub online_count: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShadowsocksUser {
    pub uid: u32,
    pub password: String,
    #[serde(default)]
    pub speed_limit: u64,
    #[serde(default)]
    pub device_limit: u32,
    #[serde(default)]
    pub online_count: u32,
}

// ── Rules ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PanelRuleSet {
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub rules: Vec<PanelRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelRule {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub pattern: String,
}

// ── Report bodies ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct StatusReport {
    pub uptime: u64,
    pub cpu: String,
    pub mem: String,
    pub disk: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct OnlineReport<'a> {
    pub uid: u32,
    pub ip: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TrafficReport {
    pub uid: u32,
    pub upload: u64,
    pub download: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ViolationReport<'a> {
    pub rule_id: i64,
    pub uid: u32,
    pub reason: &'a str,
}

/// Render a 0..=100 load value as the panel's whole-percent string.
#[expect(clippy::cast_possible_truncation)]
pub(crate) fn whole_percent(value: f64) -> String {
    format!("{}%", value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_without_data_defaults_to_null() {
        let env: Envelope = serde_json::from_str(r#"{"status":"fail","message":"no"}"#).unwrap();
        assert_eq!(env.status, "fail");
        assert_eq!(env.message.as_deref(), Some("no"));
        assert!(env.data.is_null());
    }

    #[test]
    fn percent_truncates() {
        assert_eq!(whole_percent(42.9), "42%");
        assert_eq!(whole_percent(0.0), "0%");
        assert_eq!(whole_percent(100.0), "100%");
    }

    #[test]
    fn rule_type_field_is_renamed() {
        let set: PanelRuleSet = serde_json::from_str(
            r#"{"mode":"reject","rules":[{"id":4,"type":"reg","pattern":"bt"}]}"#,
        )
        .unwrap();
        assert_eq!(set.rules[0].kind, "reg");
        assert_eq!(set.rules[0].id, 4);
    }
}
