use serde::Deserialize;

use super::{NodeOverrides, ProtocolAdapter};
use crate::error::PanelError;
use crate::model::{
    Credential, NodeConfig, NodeType, PanelUser, TlsMode, TransportSettings,
};
use crate::wire::{ShadowsocksNodeInfo, ShadowsocksUser};

/// Shadowsocks schema. The cipher is node-wide; users carry a pre-shared key.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShadowsocksAdapter;

impl ProtocolAdapter for ShadowsocksAdapter {
    fn node_type(&self) -> NodeType {
        NodeType::Shadowsocks
    }

    fn decode_node(
        &self,
        node_id: u32,
        data: &serde_json::Value,
        overrides: &NodeOverrides,
    ) -> Result<NodeConfig, PanelError> {
        let info = ShadowsocksNodeInfo::deserialize(data)
            .map_err(|e| PanelError::decode("Shadowsocks node info", e))?;

        Ok(NodeConfig {
            node_type: NodeType::Shadowsocks,
            node_id,
            port: info.port,
            speed_limit: overrides.speed_limit(info.speed_limit),
            device_limit: overrides.device_limit(info.client_limit),
            transport: TransportSettings {
                network: "tcp".to_string(),
                ..Default::default()
            },
            enable_tls: false,
            tls_mode: TlsMode::None,
            cipher: Some(info.method),
            alter_id: 0,
            enable_vless: false,
        })
    }

    fn decode_users(
        &self,
        data: &serde_json::Value,
        overrides: &NodeOverrides,
    ) -> Result<Vec<PanelUser>, PanelError> {
        let users = Vec::<ShadowsocksUser>::deserialize(data)
            .map_err(|e| PanelError::decode("Shadowsocks user list", e))?;

        Ok(users
            .into_iter()
            .map(|u| PanelUser {
                id: u.uid,
                credential: Credential::PreSharedKey(u.password),
                speed_limit: overrides.speed_limit(u.speed_limit),
                device_limit: overrides.device_limit(u.device_limit),
                online_count: u.online_count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn node_carries_cipher_without_tls() {
        let data = json!({"port": 8388, "method": "aes-256-gcm", "speed_limit": 500, "client_limit": 1});
        let node = ShadowsocksAdapter
            .decode_node(3, &data, &NodeOverrides { enable_xtls: true, ..Default::default() })
            .unwrap();
        assert_eq!(node.port, 8388);
        assert_eq!(node.cipher.as_deref(), Some("aes-256-gcm"));
        assert!(!node.enable_tls);
        assert_eq!(node.tls_mode, TlsMode::None);
        assert_eq!(node.speed_limit, 500);
        assert_eq!(node.device_limit, 1);
    }

    #[test]
    fn users_without_limits_default_to_zero() {
        let data = json!([{"uid": 1, "password": "psk", "speed_limit": 0}]);
        let users = ShadowsocksAdapter
            .decode_users(&data, &NodeOverrides::default())
            .unwrap();
        assert_eq!(users[0].credential, Credential::PreSharedKey("psk".into()));
        assert_eq!(users[0].device_limit, 0);
        assert_eq!(users[0].online_count, 0);
    }

    #[test]
    fn string_uid_fails_the_list() {
        let data = json!([{"uid": "one", "password": "psk"}]);
        assert!(ShadowsocksAdapter
            .decode_users(&data, &NodeOverrides::default())
            .is_err());
    }
}
