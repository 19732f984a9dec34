//! # nodelink
//!
//! Panel sync agent for multi-protocol (V2ray, Trojan, Shadowsocks) proxy
//! nodes.
//!
//! ## Crates
//!
//! - [`nodelink_core`] - Shared constants and defaults
//! - [`nodelink_config`] - Configuration loading and validation
//! - [`nodelink_panel`] - Panel client, reconciliation, rules and sync loop

use std::path::Path;

pub use nodelink_config as config;
pub use nodelink_core as core;
pub use nodelink_panel as panel;

/// Load and validate a config file, including the local rule list.
pub fn check_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = nodelink_config::load_config(path)?;
    nodelink_config::validate_config(&config)?;
    let node_type: panel::NodeType = config.panel.node_type.parse()?;
    let rules = panel::load_local_rules(config.panel.rule_list_path.as_deref().map(Path::new))?;
    println!(
        "{}: ok ({} node {}, {} local rules)",
        path.display(),
        node_type,
        config.panel.node_id,
        rules.len()
    );
    Ok(())
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use nodelink_config::{Config, load_config, validate_config};
    pub use nodelink_panel::{
        ClientSettings, HttpTransport, PanelClient, PanelError, SyncSnapshot, UsageCollector,
        run_sync_loop,
    };
}
