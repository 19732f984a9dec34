//! Panel sync client.
//!
//! [`PanelClient`] exposes one method per panel operation. The protocol
//! adapter is chosen once from the configured node type, so every endpoint
//! path and payload schema is fixed for the lifetime of the client.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use nodelink_panel::{ClientSettings, HttpTransport, PanelClient};
//!
//! # async fn example() -> Result<(), nodelink_panel::PanelError> {
//! let transport = HttpTransport::new("https://panel.example.com", "secret", Duration::from_secs(5), 3)?;
//! let settings = ClientSettings::new("https://panel.example.com", "secret", 1, "V2ray");
//! let client = PanelClient::new(Arc::new(transport), settings, Vec::new())?;
//! let users = client.fetch_user_list().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use nodelink_config::PanelConfig;
use nodelink_core::defaults::ENVELOPE_SUCCESS;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapter::{NodeOverrides, ProtocolAdapter, adapter_for};
use crate::error::PanelError;
use crate::model::{
    ClientInfo, NodeConfig, NodeStatus, NodeType, OnlineSession, UserRecord, UserTraffic,
    Violation,
};
use crate::reconcile::LimitReconciler;
use crate::rules::{DetectionRule, aggregate_rules, load_local_rules};
use crate::transport::{HttpTransport, Method, PanelResponse, Transport};
use crate::wire::{
    Envelope, OnlineReport, PanelRuleSet, StatusReport, TrafficReport, ViolationReport,
    whole_percent,
};

/// Reason sent with violation reports that carry none.
const DEFAULT_VIOLATION_REASON: &str = "unspecified";

/// Panel operation, the `{operation}` part of the endpoint path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Node,
    UserList,
    NodeStatus,
    NodeOnline,
    UserTraffic,
    NodeRule,
    Trigger,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::UserList => "userList",
            Self::NodeStatus => "nodeStatus",
            Self::NodeOnline => "nodeOnline",
            Self::UserTraffic => "userTraffic",
            Self::NodeRule => "nodeRule",
            Self::Trigger => "trigger",
        }
    }
}

/// `/api/{protocol}/v1/{operation}/{node_id}`
pub fn endpoint_path(node_type: NodeType, endpoint: Endpoint, node_id: u32) -> String {
    format!(
        "/api/{}/v1/{}/{}",
        node_type.path_segment(),
        endpoint.as_str(),
        node_id
    )
}

/// Identity and overrides for one client instance.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_host: String,
    pub key: String,
    pub node_id: u32,
    /// Raw node type name; parsed when the client is built.
    pub node_type: String,
    pub overrides: NodeOverrides,
}

impl ClientSettings {
    pub fn new(
        api_host: impl Into<String>,
        key: impl Into<String>,
        node_id: u32,
        node_type: impl Into<String>,
    ) -> Self {
        Self {
            api_host: api_host.into(),
            key: key.into(),
            node_id,
            node_type: node_type.into(),
            overrides: NodeOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: NodeOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

impl From<&PanelConfig> for ClientSettings {
    fn from(cfg: &PanelConfig) -> Self {
        Self::new(&cfg.api_host, &cfg.key, cfg.node_id, &cfg.node_type).with_overrides(
            NodeOverrides {
                speed_limit_mbps: cfg.speed_limit,
                device_limit: cfg.device_limit,
                enable_xtls: cfg.enable_xtls,
                enable_vless: cfg.enable_vless,
            },
        )
    }
}

/// Control-plane client for one node.
pub struct PanelClient {
    transport: Arc<dyn Transport>,
    adapter: Box<dyn ProtocolAdapter>,
    info: ClientInfo,
    overrides: NodeOverrides,
    local_rules: Vec<DetectionRule>,
    reconciler: LimitReconciler,
    /// Serializes online reports end to end.
    report_lock: tokio::sync::Mutex<()>,
}

impl PanelClient {
    /// Build a client over an arbitrary transport.
    ///
    /// Fails with [`PanelError::UnsupportedNodeType`] if the node type is
    /// not one of the supported protocols.
    pub fn new(
        transport: Arc<dyn Transport>,
        settings: ClientSettings,
        local_rules: Vec<DetectionRule>,
    ) -> Result<Self, PanelError> {
        let node_type: NodeType = settings.node_type.parse()?;
        Ok(Self {
            transport,
            adapter: adapter_for(node_type),
            info: ClientInfo {
                api_host: settings.api_host,
                node_id: settings.node_id,
                key: settings.key,
                node_type,
            },
            overrides: settings.overrides,
            local_rules,
            reconciler: LimitReconciler::new(),
            report_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Build an HTTP client from the agent config, loading the local rule list.
    pub fn from_config(cfg: &PanelConfig) -> Result<Self, PanelError> {
        let transport = HttpTransport::new(
            &cfg.api_host,
            &cfg.key,
            Duration::from_secs(cfg.timeout_secs),
            cfg.retry_count,
        )?;
        let local_rules = load_local_rules(cfg.rule_list_path.as_deref().map(Path::new))?;
        Self::new(Arc::new(transport), ClientSettings::from(cfg), local_rules)
    }

    pub fn describe(&self) -> ClientInfo {
        self.info.clone()
    }

    pub fn node_type(&self) -> NodeType {
        self.info.node_type
    }

    pub fn local_rules(&self) -> &[DetectionRule] {
        &self.local_rules
    }

    pub fn reconciler(&self) -> &LimitReconciler {
        &self.reconciler
    }

    /// Pull and normalize the node configuration.
    pub async fn fetch_node_config(&self) -> Result<NodeConfig, PanelError> {
        let envelope = self.request(Method::Get, Endpoint::Node, None).await?;
        let node = self
            .adapter
            .decode_node(self.info.node_id, &envelope.data, &self.overrides)?;
        debug!(
            node_id = node.node_id,
            port = node.port,
            tls = node.tls_mode.as_str(),
            "fetched node config"
        );
        Ok(node)
    }

    /// Pull the user list and apply device-limit reconciliation.
    ///
    /// Users without device headroom are omitted from the result.
    pub async fn fetch_user_list(&self) -> Result<Vec<UserRecord>, PanelError> {
        let envelope = self.request(Method::Get, Endpoint::UserList, None).await?;
        let users = self.adapter.decode_users(&envelope.data, &self.overrides)?;
        let total = users.len();
        let records = self.reconciler.reconcile(users);
        if records.len() < total {
            info!(
                total,
                withheld = total - records.len(),
                "users withheld for exceeding device limit"
            );
        }
        Ok(records)
    }

    /// Report host load.
    pub async fn report_status(&self, status: &NodeStatus) -> Result<(), PanelError> {
        let body = StatusReport {
            uptime: status.uptime,
            cpu: whole_percent(status.cpu),
            mem: whole_percent(status.mem),
            disk: whole_percent(status.disk),
        };
        let body = encode("node status", &body)?;
        self.request(Method::Post, Endpoint::NodeStatus, Some(body))
            .await?;
        Ok(())
    }

    /// Report the sessions currently online.
    ///
    /// The per-user counts replace the reconciler's retained state before
    /// the request is sent, whether or not the request succeeds.
    pub async fn report_online_users(&self, sessions: &[OnlineSession]) -> Result<(), PanelError> {
        let _guard = self.report_lock.lock().await;
        let tracked = self.reconciler.record_report(sessions);
        debug!(sessions = sessions.len(), users = tracked, "reporting online users");

        let body: Vec<OnlineReport<'_>> = sessions
            .iter()
            .map(|s| OnlineReport {
                uid: s.user_id,
                ip: &s.ip,
            })
            .collect();
        let body = encode("online users", &body)?;
        self.request(Method::Post, Endpoint::NodeOnline, Some(body))
            .await?;
        Ok(())
    }

    /// Report per-user traffic since the last report.
    pub async fn report_user_traffic(&self, traffic: &[UserTraffic]) -> Result<(), PanelError> {
        let body: Vec<TrafficReport> = traffic
            .iter()
            .map(|t| TrafficReport {
                uid: t.user_id,
                upload: t.upload,
                download: t.download,
            })
            .collect();
        let body = encode("user traffic", &body)?;
        self.request(Method::Post, Endpoint::UserTraffic, Some(body))
            .await?;
        Ok(())
    }

    /// Pull panel rules and merge them with the local rule list.
    pub async fn fetch_rules(&self) -> Result<Vec<DetectionRule>, PanelError> {
        let envelope = self.request(Method::Get, Endpoint::NodeRule, None).await?;
        let panel = PanelRuleSet::deserialize(&envelope.data)
            .map_err(|e| PanelError::decode("node rules", e))?;
        aggregate_rules(&self.local_rules, &panel)
    }

    /// Report rule violations, one request each.
    ///
    /// Stops at the first failure; reports already sent stay sent.
    pub async fn report_violations(&self, violations: &[Violation]) -> Result<(), PanelError> {
        for v in violations {
            let body = ViolationReport {
                rule_id: v.rule_id,
                uid: v.user_id,
                reason: v.reason.as_deref().unwrap_or(DEFAULT_VIOLATION_REASON),
            };
            let body = encode("violation", &body)?;
            self.request(Method::Post, Endpoint::Trigger, Some(body))
                .await?;
        }
        Ok(())
    }

    async fn request(
        &self,
        method: Method,
        endpoint: Endpoint,
        body: Option<serde_json::Value>,
    ) -> Result<Envelope, PanelError> {
        let path = endpoint_path(self.info.node_type, endpoint, self.info.node_id);
        let response = self.transport.send(method, &path, body.as_ref()).await?;
        parse_response(response)
    }
}

impl fmt::Debug for PanelClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelClient")
            .field("api_host", &self.info.api_host)
            .field("node_id", &self.info.node_id)
            .field("node_type", &self.info.node_type)
            .field("local_rules", &self.local_rules.len())
            .finish_non_exhaustive()
    }
}

/// Check the HTTP status and the envelope status.
fn parse_response(response: PanelResponse) -> Result<Envelope, PanelError> {
    if response.status >= 400 {
        return Err(PanelError::Http {
            url: response.url,
            status: response.status,
            body: response.body,
        });
    }

    let envelope: Envelope = serde_json::from_str(&response.body)
        .map_err(|e| PanelError::decode("response envelope", e))?;

    if envelope.status != ENVELOPE_SUCCESS {
        let raw = serde_json::to_string(&envelope).unwrap_or(response.body);
        return Err(PanelError::Envelope(raw));
    }
    Ok(envelope)
}

fn encode<T: Serialize + ?Sized>(payload: &'static str, body: &T) -> Result<serde_json::Value, PanelError> {
    serde_json::to_value(body).map_err(|source| PanelError::Encode { payload, source })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::model::Credential;

    type Handler = dyn Fn(&str) -> Result<(u16, serde_json::Value), PanelError> + Send + Sync;

    /// In-memory transport that records requests and answers from a handler.
    struct MockTransport {
        handler: Box<Handler>,
        requests: Mutex<Vec<(Method, String, Option<serde_json::Value>)>>,
    }

    impl MockTransport {
        fn new(
            handler: impl Fn(&str) -> Result<(u16, serde_json::Value), PanelError>
            + Send
            + Sync
            + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn ok(data: serde_json::Value) -> Arc<Self> {
            Self::new(move |_| Ok((200, json!({"status": "success", "data": data.clone()}))))
        }

        fn requests(&self) -> Vec<(Method, String, Option<serde_json::Value>)> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(
            &self,
            method: Method,
            path: &str,
            body: Option<&serde_json::Value>,
        ) -> Result<PanelResponse, PanelError> {
            self.requests
                .lock()
                .push((method, path.to_string(), body.cloned()));
            let (status, body) = (self.handler)(path)?;
            Ok(PanelResponse {
                url: format!("http://panel.test{path}"),
                status,
                body: body.to_string(),
            })
        }
    }

    fn client(transport: Arc<MockTransport>, node_type: &str) -> PanelClient {
        let settings = ClientSettings::new("http://panel.test", "secret", 7, node_type);
        PanelClient::new(transport, settings, Vec::new()).unwrap()
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(
            endpoint_path(NodeType::V2ray, Endpoint::Node, 1),
            "/api/v2ray/v1/node/1"
        );
        assert_eq!(
            endpoint_path(NodeType::Trojan, Endpoint::UserList, 2),
            "/api/trojan/v1/userList/2"
        );
        assert_eq!(
            endpoint_path(NodeType::Shadowsocks, Endpoint::Trigger, 3),
            "/api/ss/v1/trigger/3"
        );
        assert_eq!(Endpoint::NodeStatus.as_str(), "nodeStatus");
        assert_eq!(Endpoint::NodeOnline.as_str(), "nodeOnline");
        assert_eq!(Endpoint::UserTraffic.as_str(), "userTraffic");
        assert_eq!(Endpoint::NodeRule.as_str(), "nodeRule");
    }

    #[test]
    fn unsupported_node_type_fails_construction() {
        let settings = ClientSettings::new("http://panel.test", "k", 1, "Tuic");
        let err = PanelClient::new(MockTransport::ok(json!(null)), settings, Vec::new())
            .unwrap_err();
        assert!(matches!(err, PanelError::UnsupportedNodeType(ref t) if t == "Tuic"));
    }

    #[test]
    fn describe_reports_identity() {
        let c = client(MockTransport::ok(json!(null)), "trojan");
        let info = c.describe();
        assert_eq!(info.node_id, 7);
        assert_eq!(info.node_type, NodeType::Trojan);
        assert_eq!(info.key, "secret");
        assert_eq!(info.api_host, "http://panel.test");
    }

    #[tokio::test]
    async fn fetch_node_config_uses_protocol_path() {
        let transport = MockTransport::ok(json!({"trojan_port": 443, "speed_limit": 0, "client_limit": 2}));
        let c = client(transport.clone(), "Trojan");
        let node = c.fetch_node_config().await.unwrap();
        assert_eq!(node.port, 443);
        assert_eq!(node.device_limit, 2);
        assert_eq!(node.node_id, 7);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, Method::Get);
        assert_eq!(requests[0].1, "/api/trojan/v1/node/7");
        assert!(requests[0].2.is_none());
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_a_semantic_error() {
        let transport = MockTransport::new(|_| {
            Ok((200, json!({"status": "fail", "code": 403, "message": "bad key", "data": null})))
        });
        let err = client(transport, "V2ray")
            .fetch_node_config()
            .await
            .unwrap_err();
        match err {
            PanelError::Envelope(raw) => {
                assert!(raw.contains("bad key"));
                assert!(raw.contains("\"fail\""));
            }
            other => panic!("expected envelope error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_error_status_is_transport_level() {
        for status in [400, 404, 500] {
            let transport = MockTransport::new(move |_| Ok((status, json!("oops"))));
            let err = client(transport, "V2ray").fetch_rules().await.unwrap_err();
            assert!(err.is_transport());
            assert!(matches!(err, PanelError::Http { status: s, .. } if s == status));
        }
    }

    #[tokio::test]
    async fn malformed_user_list_returns_no_users() {
        let transport = MockTransport::ok(json!([
            {"uid": 1, "vmess_uid": "a", "device_limit": 1},
            {"vmess_uid": "b"}
        ]));
        let err = client(transport, "V2ray")
            .fetch_user_list()
            .await
            .unwrap_err();
        assert!(matches!(err, PanelError::Decode { .. }));
    }

    #[tokio::test]
    async fn reported_sessions_restore_headroom() {
        let transport = MockTransport::new(|path| {
            if path.contains("userList") {
                Ok((200, json!({"status": "success", "data": [
                    {"uid": 7, "vmess_uid": "u7", "speed_limit": 0, "device_limit": 2, "online_count": 2},
                    {"uid": 8, "vmess_uid": "u8", "speed_limit": 0, "device_limit": 2, "online_count": 2}
                ]})))
            } else {
                Ok((200, json!({"status": "success", "data": null})))
            }
        });
        let c = client(transport.clone(), "V2ray");

        c.report_online_users(&[
            OnlineSession { user_id: 7, ip: "1.1.1.1".into() },
            OnlineSession { user_id: 7, ip: "2.2.2.2".into() },
        ])
        .await
        .unwrap();
        assert_eq!(c.reconciler().retained(7), Some(2));

        let users = c.fetch_user_list().await.unwrap();
        assert_eq!(users.len(), 1, "user 8 has no headroom and no held sessions");
        assert_eq!(users[0].id, 7);
        assert_eq!(users[0].device_limit, 2);
        assert_eq!(users[0].credential, Credential::Uuid("u7".into()));

        let requests = transport.requests();
        assert_eq!(requests[0].1, "/api/v2ray/v1/nodeOnline/7");
        assert_eq!(
            requests[0].2,
            Some(json!([{"uid": 7, "ip": "1.1.1.1"}, {"uid": 7, "ip": "2.2.2.2"}]))
        );
    }

    #[tokio::test]
    async fn failed_online_report_still_updates_state() {
        let transport = MockTransport::new(|_| Ok((502, json!("bad gateway"))));
        let c = client(transport, "Trojan");
        let result = c
            .report_online_users(&[OnlineSession { user_id: 3, ip: "1.1.1.1".into() }])
            .await;
        assert!(result.is_err());
        assert_eq!(c.reconciler().retained(3), Some(1));
    }

    #[tokio::test]
    async fn status_is_sent_as_whole_percent_strings() {
        let transport = MockTransport::ok(json!(null));
        let c = client(transport.clone(), "ss");
        c.report_status(&NodeStatus {
            uptime: 3600,
            cpu: 12.7,
            mem: 50.0,
            disk: 99.99,
        })
        .await
        .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].1, "/api/ss/v1/nodeStatus/7");
        assert_eq!(
            requests[0].2,
            Some(json!({"uptime": 3600, "cpu": "12%", "mem": "50%", "disk": "99%"}))
        );
    }

    #[tokio::test]
    async fn traffic_report_body() {
        let transport = MockTransport::ok(json!(null));
        let c = client(transport.clone(), "V2ray");
        c.report_user_traffic(&[UserTraffic { user_id: 1, upload: 10, download: 20 }])
            .await
            .unwrap();
        let requests = transport.requests();
        assert_eq!(requests[0].1, "/api/v2ray/v1/userTraffic/7");
        assert_eq!(
            requests[0].2,
            Some(json!([{"uid": 1, "upload": 10, "download": 20}]))
        );
    }

    #[tokio::test]
    async fn violations_stop_at_first_failure() {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = calls.clone();
        let transport = MockTransport::new(move |_| {
            let mut n = counter.lock();
            *n += 1;
            if *n == 2 {
                Ok((200, json!({"status": "error", "message": "rate limited"})))
            } else {
                Ok((200, json!({"status": "success"})))
            }
        });
        let c = client(transport.clone(), "V2ray");
        let violations = [
            Violation { rule_id: -1, user_id: 1, reason: None },
            Violation { rule_id: 3, user_id: 2, reason: Some("bt".into()) },
            Violation { rule_id: 4, user_id: 3, reason: None },
        ];
        let err = c.report_violations(&violations).await.unwrap_err();
        assert!(matches!(err, PanelError::Envelope(_)));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].2,
            Some(json!({"rule_id": -1, "uid": 1, "reason": "unspecified"}))
        );
        assert_eq!(
            requests[1].2,
            Some(json!({"rule_id": 3, "uid": 2, "reason": "bt"}))
        );
    }

    #[tokio::test]
    async fn rules_in_allow_mode_are_local_only() {
        let transport = MockTransport::ok(json!({
            "mode": "allow",
            "rules": [{"id": 1, "type": "regex", "pattern": "bt"}]
        }));
        let settings = ClientSettings::new("http://panel.test", "k", 7, "V2ray");
        let local = vec![DetectionRule::new(-1, "torrent").unwrap()];
        let c = PanelClient::new(transport, settings, local).unwrap();
        let rules = c.fetch_rules().await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, -1);
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let transport = MockTransport::new(|path| {
            Err(PanelError::Transport {
                url: path.to_string(),
                message: "connection refused".into(),
            })
        });
        let err = client(transport, "V2ray")
            .fetch_user_list()
            .await
            .unwrap_err();
        assert!(matches!(err, PanelError::Transport { .. }));
    }

    #[tokio::test]
    async fn settings_from_config_carry_overrides() {
        let cfg = PanelConfig {
            api_host: "http://panel.test".into(),
            key: "k".into(),
            node_id: 7,
            node_type: "V2ray".into(),
            timeout_secs: 5,
            retry_count: 0,
            enable_xtls: true,
            enable_vless: false,
            speed_limit: 8.0,
            device_limit: 0,
            rule_list_path: None,
        };
        let transport = MockTransport::ok(json!({
            "v2_port": 443, "v2_net": "ws", "v2_tls": true, "speed_limit": 1, "client_limit": 0
        }));
        let c = PanelClient::new(transport, ClientSettings::from(&cfg), Vec::new()).unwrap();
        let node = c.fetch_node_config().await.unwrap();
        assert_eq!(node.speed_limit, 1_000_000);
        assert_eq!(node.tls_mode.as_str(), "xtls");
    }
}
