//! Parser configuration

use oh_core::{EVENT_NAMESPACE, STARTLEVEL_RULES_LOADED, UID_PREFIX};
use serde::{Deserialize, Serialize};

/// Settings for trigger construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhenConfig {
    /// Marker put in front of uids that do not start with a letter or digit
    pub uid_prefix: String,

    /// First segment of generic event topics and sources
    pub event_namespace: String,

    /// Start level used for `System started`
    pub system_started_startlevel: u32,
}

impl Default for WhenConfig {
    fn default() -> Self {
        Self {
            uid_prefix: UID_PREFIX.to_string(),
            event_namespace: EVENT_NAMESPACE.to_string(),
            system_started_startlevel: STARTLEVEL_RULES_LOADED,
        }
    }
}
