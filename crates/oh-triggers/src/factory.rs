//! Trigger construction seam
//!
//! The host's automation engine turns specs into live triggers. Rules only
//! ever hold the opaque [`TriggerHandle`] it hands back.

use oh_core::type_codes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use ulid::Ulid;

use crate::spec::TriggerSpec;

/// Trigger construction errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error("Unknown trigger type: {0}")]
    UnknownType(String),

    #[error("Trigger {id} ({type_code}) is missing configuration key '{key}'")]
    MissingConfiguration {
        id: String,
        type_code: String,
        key: &'static str,
    },
}

/// Result type for trigger construction
pub type FactoryResult<T> = Result<T, FactoryError>;

/// A constructed trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerHandle {
    /// Engine-assigned handle id
    pub handle_id: String,

    /// The spec the trigger was built from
    pub spec: TriggerSpec,
}

/// Turns trigger specs into engine triggers
pub trait TriggerFactory: Send + Sync {
    fn create(&self, spec: &TriggerSpec) -> FactoryResult<TriggerHandle>;
}

/// Configuration keys a type code cannot do without
fn required_keys(type_code: &str) -> Option<&'static [&'static str]> {
    let keys: &'static [&'static str] = match type_code {
        type_codes::ITEM_STATE_CHANGE | type_codes::ITEM_STATE_UPDATE | type_codes::ITEM_COMMAND => {
            &["itemName"]
        }
        type_codes::THING_STATUS_CHANGE | type_codes::THING_STATUS_UPDATE => &["thingUID"],
        type_codes::CHANNEL_EVENT => &["channelUID"],
        type_codes::GENERIC_CRON => &["cronExpression"],
        type_codes::SYSTEM_STARTLEVEL => &["startlevel"],
        type_codes::GENERIC_EVENT => &["eventTopic", "eventSource", "eventTypes"],
        _ => return None,
    };
    Some(keys)
}

/// Factory that checks required configuration keys and stamps a ULID handle
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTriggerFactory;

impl DefaultTriggerFactory {
    pub fn new() -> Self {
        Self
    }
}

impl TriggerFactory for DefaultTriggerFactory {
    fn create(&self, spec: &TriggerSpec) -> FactoryResult<TriggerHandle> {
        let keys = required_keys(&spec.type_code)
            .ok_or_else(|| FactoryError::UnknownType(spec.type_code.clone()))?;

        if let Some(key) = keys.iter().copied().find(|k| !spec.configuration.contains_key(*k)) {
            return Err(FactoryError::MissingConfiguration {
                id: spec.id.clone(),
                type_code: spec.type_code.clone(),
                key,
            });
        }

        let handle = TriggerHandle {
            handle_id: Ulid::new().to_string(),
            spec: spec.clone(),
        };
        debug!(id = %spec.id, handle = %handle.handle_id, "Constructed trigger");
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_stamps_handle() {
        let factory = DefaultTriggerFactory::new();
        let spec = TriggerSpec::cron("0 0 * * * ?", "hourly");
        let a = factory.create(&spec).unwrap();
        let b = factory.create(&spec).unwrap();
        assert_eq!(a.spec, spec);
        assert_ne!(a.handle_id, b.handle_id);
    }

    #[test]
    fn test_unknown_type() {
        let spec = TriggerSpec::new("core.TimeOfDayTrigger", "t");
        assert_eq!(
            DefaultTriggerFactory.create(&spec).unwrap_err(),
            FactoryError::UnknownType("core.TimeOfDayTrigger".into())
        );
    }

    #[test]
    fn test_missing_configuration() {
        let spec = TriggerSpec::new(type_codes::GENERIC_EVENT, "t")
            .with("eventTopic", "openhab/*")
            .with("eventSource", "openhab/items/");
        match DefaultTriggerFactory.create(&spec).unwrap_err() {
            FactoryError::MissingConfiguration { key, .. } => assert_eq!(key, "eventTypes"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
