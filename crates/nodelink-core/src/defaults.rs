//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Panel Request Defaults
// ============================================================================

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
/// Default retry attempts for a request that failed at the transport level.
pub const DEFAULT_RETRY_COUNT: u32 = 3;
/// Base delay between retries in milliseconds (multiplied by the attempt number).
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 100;

// ============================================================================
// Sync Loop Defaults
// ============================================================================

/// Default interval between node/user/rule polls in seconds.
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 60;
/// Default interval between status/online/traffic reports in seconds.
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 60;

// ============================================================================
// Node Defaults
// ============================================================================

/// Default node type when the config does not name one.
pub const DEFAULT_NODE_TYPE: &str = "V2ray";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// Panel Protocol Constants
// ============================================================================

/// Header carrying the node's shared secret.
pub const HEADER_KEY: &str = "key";
/// Header carrying the request's unix timestamp.
pub const HEADER_TIMESTAMP: &str = "timestamp";
/// Envelope status value that marks a usable payload.
pub const ENVELOPE_SUCCESS: &str = "success";
/// Rule id assigned to rules loaded from the local rule list.
pub const LOCAL_RULE_ID: i64 = -1;
/// Node type names accepted in configuration (matched case-insensitively).
pub const SUPPORTED_NODE_TYPES: &[&str] = &["v2ray", "trojan", "shadowsocks", "ss"];
