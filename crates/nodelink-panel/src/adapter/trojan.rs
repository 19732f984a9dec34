use serde::Deserialize;

use super::{NodeOverrides, ProtocolAdapter};
use crate::error::PanelError;
use crate::model::{Credential, NodeConfig, NodeType, PanelUser, TransportSettings};
use crate::wire::{TrojanNodeInfo, TrojanUser};

/// Trojan schema. Trojan always runs over TLS on plain TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrojanAdapter;

impl ProtocolAdapter for TrojanAdapter {
    fn node_type(&self) -> NodeType {
        NodeType::Trojan
    }

    fn decode_node(
        &self,
        node_id: u32,
        data: &serde_json::Value,
        overrides: &NodeOverrides,
    ) -> Result<NodeConfig, PanelError> {
        let info = TrojanNodeInfo::deserialize(data)
            .map_err(|e| PanelError::decode("Trojan node info", e))?;

        Ok(NodeConfig {
            node_type: NodeType::Trojan,
            node_id,
            port: info.trojan_port,
            speed_limit: overrides.speed_limit(info.speed_limit),
            device_limit: overrides.device_limit(info.client_limit),
            transport: TransportSettings {
                network: "tcp".to_string(),
                ..Default::default()
            },
            enable_tls: true,
            tls_mode: overrides.tls_mode(),
            cipher: None,
            alter_id: 0,
            enable_vless: false,
        })
    }

    fn decode_users(
        &self,
        data: &serde_json::Value,
        overrides: &NodeOverrides,
    ) -> Result<Vec<PanelUser>, PanelError> {
        let users = Vec::<TrojanUser>::deserialize(data)
            .map_err(|e| PanelError::decode("Trojan user list", e))?;

        Ok(users
            .into_iter()
            .map(|u| PanelUser {
                id: u.uid,
                credential: Credential::Password(u.password),
                speed_limit: overrides.speed_limit(u.speed_limit),
                device_limit: overrides.device_limit(u.device_limit),
                online_count: u.online_count,
            })
            .collect())
    }
}
