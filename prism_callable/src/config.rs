//! Runtime configuration for the call layer.
//!
//! Resolved once from environment variables, then read without locking on
//! every call.

use std::sync::OnceLock;

/// Default maximum nesting of dispatched calls.
pub const DEFAULT_RECURSION_LIMIT: u32 = 1000;

/// Call-layer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum depth of nested dispatches per thread (`PRISM_RECURSION_LIMIT`).
    pub recursion_limit: u32,

    /// Validate calling-convention flags when dispatch tables are
    /// materialized (`PRISM_CHECK_METHOD_FLAGS`). When off, a malformed
    /// entry is only detected at call time.
    pub check_method_flags: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            check_method_flags: true,
        }
    }
}

impl RuntimeConfig {
    /// Resolve configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            recursion_limit: Self::env_u32("PRISM_RECURSION_LIMIT")
                .filter(|&limit| limit > 0)
                .unwrap_or(defaults.recursion_limit),
            check_method_flags: Self::env_bool("PRISM_CHECK_METHOD_FLAGS")
                .unwrap_or(defaults.check_method_flags),
        }
    }

    fn env_u32(name: &str) -> Option<u32> {
        std::env::var(name).ok()?.trim().parse().ok()
    }

    /// `1`/`true`/`yes`/`on` enable, `0`/`false`/`no`/`off` disable.
    fn env_bool(name: &str) -> Option<bool> {
        Self::parse_bool(&std::env::var(name).ok()?)
    }

    fn parse_bool(raw: &str) -> Option<bool> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

static CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

/// Process-wide configuration, resolved from the environment on first use.
pub fn config() -> &'static RuntimeConfig {
    CONFIG.get_or_init(RuntimeConfig::from_env)
}

/// Install an explicit configuration.
///
/// Returns `false` if the configuration was already resolved.
pub fn init_config(config: RuntimeConfig) -> bool {
    CONFIG.set(config).is_ok()
}
