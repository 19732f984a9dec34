//! Protocol schema adapters.
//!
//! Each supported node type has its own JSON schema for node info and user
//! lists. An adapter turns the `data` field of a panel envelope into the
//! normalized [`NodeConfig`] and [`PanelUser`] records. Decoding is
//! all-or-nothing: one malformed user fails the whole list.

mod shadowsocks;
mod trojan;
mod v2ray;

use std::fmt;

use crate::error::PanelError;
use crate::model::{NodeConfig, NodeType, PanelUser, TlsMode};

pub use shadowsocks::ShadowsocksAdapter;
pub use trojan::TrojanAdapter;
pub use v2ray::V2rayAdapter;

/// Client-side settings that take precedence over panel values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeOverrides {
    /// Speed limit in Mbps, 0 = use the panel value.
    pub speed_limit_mbps: f64,
    /// Device limit, 0 = use the panel value.
    pub device_limit: u32,
    pub enable_xtls: bool,
    pub enable_vless: bool,
}

impl NodeOverrides {
    /// Effective speed limit in bytes per second.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn speed_limit(&self, panel_value: u64) -> u64 {
        if self.speed_limit_mbps > 0.0 {
            (self.speed_limit_mbps * 1_000_000.0 / 8.0) as u64
        } else {
            panel_value
        }
    }

    /// Device limit before reconciliation.
    pub fn device_limit(&self, panel_value: u32) -> u32 {
        if self.device_limit > 0 {
            self.device_limit
        } else {
            panel_value
        }
    }

    pub fn tls_mode(&self) -> TlsMode {
        TlsMode::preferred(self.enable_xtls)
    }
}

/// Translates one protocol's panel payloads into normalized records.
pub trait ProtocolAdapter: Send + Sync + fmt::Debug {
    fn node_type(&self) -> NodeType;

    /// Decode the node-info payload.
    fn decode_node(
        &self,
        node_id: u32,
        data: &serde_json::Value,
        overrides: &NodeOverrides,
    ) -> Result<NodeConfig, PanelError>;

    /// Decode the user-list payload, preserving panel order.
    fn decode_users(
        &self,
        data: &serde_json::Value,
        overrides: &NodeOverrides,
    ) -> Result<Vec<PanelUser>, PanelError>;
}

/// Select the adapter for a node type.
pub fn adapter_for(node_type: NodeType) -> Box<dyn ProtocolAdapter> {
    match node_type {
        NodeType::V2ray => Box::new(V2rayAdapter),
        NodeType::Trojan => Box::new(TrojanAdapter),
        NodeType::Shadowsocks => Box::new(ShadowsocksAdapter),
    }
}
