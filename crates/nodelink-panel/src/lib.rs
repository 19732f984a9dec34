//! Panel sync client for proxy nodes.
//!
//! Talks to a proxy management panel on behalf of one node: pulls the node
//! configuration, user list and detection rules, and pushes host status,
//! online sessions, traffic and rule violations.
//!
//! - [`adapter`] - per-protocol payload decoding (V2ray, Trojan, Shadowsocks)
//! - [`reconcile`] - device-limit reconciliation against reported sessions
//! - [`rules`] - local rule list loading and panel rule aggregation
//! - [`client`] - the [`PanelClient`] façade over a [`Transport`]
//! - [`daemon`] - timer-driven sync loop publishing [`SyncSnapshot`]s

pub mod adapter;
pub mod cli;
pub mod client;
pub mod collector;
pub mod daemon;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod rules;
pub mod status;
pub mod transport;
pub mod wire;

pub use adapter::{NodeOverrides, ProtocolAdapter, adapter_for};
pub use cli::SyncArgs;
pub use client::{ClientSettings, Endpoint, PanelClient, endpoint_path};
pub use collector::{UsageBatch, UsageCollector};
pub use daemon::{SyncIntervals, SyncSnapshot, run_sync_loop};
pub use error::PanelError;
pub use model::*;
pub use reconcile::{LimitReconciler, effective_device_limit};
pub use rules::{DetectionRule, aggregate_rules, first_match, load_local_rules};
pub use status::SystemProbe;
pub use transport::{HttpTransport, Method, PanelResponse, Transport};
pub use wire::{Envelope, PanelRule, PanelRuleSet};
