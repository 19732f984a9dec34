//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `nodelink_core::defaults`.

use nodelink_core::defaults;

/// Generate default value functions that forward to nodelink_core::defaults constants.
macro_rules! default_fns {
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

/// Generate default value functions that return String from &str constants.
macro_rules! default_string_fns {
    ($($fn_name:ident => $const_name:ident),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> String {
                defaults::$const_name.to_string()
            }
        )*
    };
}

default_fns! {
    default_timeout_secs         => DEFAULT_REQUEST_TIMEOUT_SECS: u64,
    default_retry_count          => DEFAULT_RETRY_COUNT: u32,
    default_update_interval_secs => DEFAULT_UPDATE_INTERVAL_SECS: u64,
    default_report_interval_secs => DEFAULT_REPORT_INTERVAL_SECS: u64,
}

default_string_fns! {
    default_node_type => DEFAULT_NODE_TYPE,
}
