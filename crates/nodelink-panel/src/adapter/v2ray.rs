use serde::Deserialize;

use super::{NodeOverrides, ProtocolAdapter};
use crate::error::PanelError;
use crate::model::{
    Credential, NodeConfig, NodeType, PanelUser, TlsMode, TransportSettings,
};
use crate::wire::{V2rayNodeInfo, VmessUser};

/// Obfuscation sub-type that gets a synthesized HTTP header fragment.
const HTTP_FAKE_TYPE: &str = "http";

/// V2ray (VMess / VLESS) schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct V2rayAdapter;

impl ProtocolAdapter for V2rayAdapter {
    fn node_type(&self) -> NodeType {
        NodeType::V2ray
    }

    fn decode_node(
        &self,
        node_id: u32,
        data: &serde_json::Value,
        overrides: &NodeOverrides,
    ) -> Result<NodeConfig, PanelError> {
        let info = V2rayNodeInfo::deserialize(data)
            .map_err(|e| PanelError::decode("V2ray node info", e))?;

        let header = (info.v2_type == HTTP_FAKE_TYPE).then(|| {
            serde_json::json!({
                "type": "http",
                "request": { "path": info.v2_path },
            })
        });

        Ok(NodeConfig {
            node_type: NodeType::V2ray,
            node_id,
            port: info.v2_port,
            speed_limit: overrides.speed_limit(info.speed_limit),
            device_limit: overrides.device_limit(info.client_limit),
            transport: TransportSettings {
                network: info.v2_net,
                host: info.v2_host,
                path: info.v2_path,
                fake_type: info.v2_type,
                header,
            },
            enable_tls: info.v2_tls,
            tls_mode: if info.v2_tls {
                overrides.tls_mode()
            } else {
                TlsMode::None
            },
            cipher: None,
            alter_id: info.v2_alter_id,
            enable_vless: overrides.enable_vless,
        })
    }

    fn decode_users(
        &self,
        data: &serde_json::Value,
        overrides: &NodeOverrides,
    ) -> Result<Vec<PanelUser>, PanelError> {
        let users = Vec::<VmessUser>::deserialize(data)
            .map_err(|e| PanelError::decode("V2ray user list", e))?;

        Ok(users
            .into_iter()
            .map(|u| PanelUser {
                id: u.uid,
                credential: Credential::Uuid(u.vmess_uid),
                speed_limit: overrides.speed_limit(u.speed_limit),
                device_limit: overrides.device_limit(u.device_limit),
                online_count: u.online_count,
            })
            .collect())
    }
}
