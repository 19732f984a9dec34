//! Normalized node, user and telemetry types handed to the proxy engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PanelError;

/// Protocol family served by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    V2ray,
    Trojan,
    Shadowsocks,
}

impl NodeType {
    /// Path segment used in panel endpoint URLs.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::V2ray => "v2ray",
            Self::Trojan => "trojan",
            Self::Shadowsocks => "ss",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::V2ray => "V2ray",
            Self::Trojan => "Trojan",
            Self::Shadowsocks => "Shadowsocks",
        };
        f.write_str(name)
    }
}

impl FromStr for NodeType {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v2ray" => Ok(Self::V2ray),
            "trojan" => Ok(Self::Trojan),
            "shadowsocks" | "ss" => Ok(Self::Shadowsocks),
            _ => Err(PanelError::UnsupportedNodeType(s.to_string())),
        }
    }
}

/// TLS flavour applied to nodes that need TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    #[default]
    None,
    Tls,
    Xtls,
}

impl TlsMode {
    /// Mode for TLS-enabled nodes, chosen once from the client flag.
    pub fn preferred(enable_xtls: bool) -> Self {
        if enable_xtls { Self::Xtls } else { Self::Tls }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Tls => "tls",
            Self::Xtls => "xtls",
        }
    }
}

/// Transport parameters for the node's inbound.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransportSettings {
    /// Network type (`tcp`, `ws`, `grpc`, ...).
    pub network: String,
    pub host: String,
    pub path: String,
    /// Obfuscation sub-type (`none`, `http`, ...).
    pub fake_type: String,
    /// Opaque header fragment for HTTP-disguise modes.
    pub header: Option<serde_json::Value>,
}

/// Normalized node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node_type: NodeType,
    pub node_id: u32,
    pub port: u32,
    /// Bytes per second, 0 = unlimited.
    pub speed_limit: u64,
    /// Concurrent devices per user, 0 = unlimited.
    pub device_limit: u32,
    pub transport: TransportSettings,
    pub enable_tls: bool,
    pub tls_mode: TlsMode,
    /// Shadowsocks cipher method.
    pub cipher: Option<String>,
    /// VMess alter id.
    pub alter_id: u16,
    pub enable_vless: bool,
}

/// Protocol-specific user secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Credential {
    Uuid(String),
    Password(String),
    PreSharedKey(String),
}

impl Credential {
    pub fn secret(&self) -> &str {
        match self {
            Self::Uuid(s) | Self::Password(s) | Self::PreSharedKey(s) => s,
        }
    }
}

// Keep secrets out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(uuid) => f.debug_tuple("Uuid").field(uuid).finish(),
            Self::Password(_) => f.write_str("Password(<redacted>)"),
            Self::PreSharedKey(_) => f.write_str("PreSharedKey(<redacted>)"),
        }
    }
}

/// A user as the panel describes it, before device-limit reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelUser {
    pub id: u32,
    pub credential: Credential,
    /// Effective speed limit in bytes per second.
    pub speed_limit: u64,
    /// Device limit after the client override, before reconciliation.
    pub device_limit: u32,
    /// Concurrent sessions the panel currently counts for this user.
    pub online_count: u32,
}

/// A user ready to be handed to the proxy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u32,
    pub credential: Credential,
    /// Bytes per second, 0 = unlimited.
    pub speed_limit: u64,
    /// Effective device limit for this cycle, 0 = unlimited.
    pub device_limit: u32,
}

/// One active connection observed by the proxy engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineSession {
    pub user_id: u32,
    pub ip: String,
}

/// Traffic accumulated for one user since the last report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTraffic {
    pub user_id: u32,
    pub upload: u64,
    pub download: u64,
}

/// Host load sample; percentages are 0.0..=100.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeStatus {
    pub uptime: u64,
    pub cpu: f64,
    pub mem: f64,
    pub disk: f64,
}

/// A detection rule hit to report to the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule_id: i64,
    pub user_id: u32,
    pub reason: Option<String>,
}

/// Identity of a client instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub api_host: String,
    pub node_id: u32,
    pub key: String,
    pub node_type: NodeType,
}
