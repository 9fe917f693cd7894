//! Trigger specifications
//!
//! A [`TriggerSpec`] is what the automation engine consumes: a type code, a
//! configuration mapping and a unique id. The constructors here mirror the
//! engine's trigger types one to one.

use indexmap::IndexMap;
use oh_core::type_codes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Trigger configuration, in insertion order
pub type Configuration = IndexMap<String, Value>;

/// One trigger for the automation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerSpec {
    /// Engine trigger type (e.g., "core.ItemStateChangeTrigger")
    pub type_code: String,

    /// Type-specific settings
    #[serde(default)]
    pub configuration: Configuration,

    /// Unique trigger id
    pub id: String,
}

/// Event types for a generic event trigger (single or list)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTypes {
    Single(String),
    List(Vec<String>),
}

impl EventTypes {
    /// Value as the engine expects it: list entries comma-joined
    pub fn joined(&self) -> String {
        match self {
            EventTypes::Single(t) => t.clone(),
            EventTypes::List(types) => types.join(","),
        }
    }
}

impl From<&str> for EventTypes {
    fn from(t: &str) -> Self {
        EventTypes::Single(t.to_string())
    }
}

impl From<Vec<String>> for EventTypes {
    fn from(types: Vec<String>) -> Self {
        EventTypes::List(types)
    }
}

impl TriggerSpec {
    /// Create a spec with an empty configuration
    pub fn new(type_code: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_code: type_code.into(),
            configuration: Configuration::new(),
            id: id.into(),
        }
    }

    /// Set a configuration value
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.configuration.insert(key.to_string(), value.into());
        self
    }

    /// Set a configuration value when present
    pub fn with_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Configuration value as a string
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.configuration.get(key).and_then(Value::as_str)
    }

    pub fn item_state_change(
        item: &str,
        previous_state: Option<&str>,
        state: Option<&str>,
        id: impl Into<String>,
    ) -> Self {
        Self::new(type_codes::ITEM_STATE_CHANGE, id)
            .with("itemName", item)
            .with_opt("previousState", previous_state)
            .with_opt("state", state)
    }

    pub fn item_state_update(item: &str, state: Option<&str>, id: impl Into<String>) -> Self {
        Self::new(type_codes::ITEM_STATE_UPDATE, id)
            .with("itemName", item)
            .with_opt("state", state)
    }

    pub fn item_command(item: &str, command: Option<&str>, id: impl Into<String>) -> Self {
        Self::new(type_codes::ITEM_COMMAND, id)
            .with("itemName", item)
            .with_opt("command", command)
    }

    pub fn thing_status_change(
        thing: &str,
        previous_status: Option<&str>,
        status: Option<&str>,
        id: impl Into<String>,
    ) -> Self {
        Self::new(type_codes::THING_STATUS_CHANGE, id)
            .with("thingUID", thing)
            .with_opt("previousStatus", previous_status)
            .with_opt("status", status)
    }

    pub fn thing_status_update(thing: &str, status: Option<&str>, id: impl Into<String>) -> Self {
        Self::new(type_codes::THING_STATUS_UPDATE, id)
            .with("thingUID", thing)
            .with_opt("status", status)
    }

    pub fn channel_event(channel: &str, event: Option<&str>, id: impl Into<String>) -> Self {
        Self::new(type_codes::CHANNEL_EVENT, id)
            .with("channelUID", channel)
            .with_opt("event", event)
    }

    pub fn cron(expression: &str, id: impl Into<String>) -> Self {
        Self::new(type_codes::GENERIC_CRON, id).with("cronExpression", expression)
    }

    pub fn system_startlevel(startlevel: u32, id: impl Into<String>) -> Self {
        Self::new(type_codes::SYSTEM_STARTLEVEL, id).with("startlevel", startlevel)
    }

    /// Generic event trigger
    ///
    /// Listens on `<namespace>/*` for events whose source starts with
    /// `<namespace>/<source_path>/`.
    pub fn generic_event(
        namespace: &str,
        source_path: &str,
        event_types: impl Into<EventTypes>,
        id: impl Into<String>,
    ) -> Self {
        Self::new(type_codes::GENERIC_EVENT, id)
            .with("eventTopic", format!("{}/*", namespace))
            .with("eventSource", format!("{}/{}/", namespace, source_path))
            .with("eventTypes", event_types.into().joined())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_state_change_skips_missing_states() {
        let spec = TriggerSpec::item_state_change("Kitchen_Light", None, Some("ON"), "t1");
        assert_eq!(spec.type_code, "core.ItemStateChangeTrigger");
        assert_eq!(
            serde_json::to_value(&spec.configuration).unwrap(),
            json!({"itemName": "Kitchen_Light", "state": "ON"})
        );
    }

    #[test]
    fn test_generic_event_joins_types() {
        let spec = TriggerSpec::generic_event(
            "openhab",
            "items/Kitchen_Light",
            vec!["ItemAddedEvent".to_string(), "ItemRemovedEvent".to_string()],
            "t2",
        );
        assert_eq!(spec.config_str("eventTopic"), Some("openhab/*"));
        assert_eq!(spec.config_str("eventSource"), Some("openhab/items/Kitchen_Light/"));
        assert_eq!(
            spec.config_str("eventTypes"),
            Some("ItemAddedEvent,ItemRemovedEvent")
        );
    }

    #[test]
    fn test_system_startlevel_is_numeric() {
        let spec = TriggerSpec::system_startlevel(40, "t3");
        assert_eq!(spec.configuration["startlevel"], json!(40));
    }

    #[test]
    fn test_event_types_deserialize() {
        let single: EventTypes = serde_json::from_str(r#""ThingAddedEvent""#).unwrap();
        assert_eq!(single.joined(), "ThingAddedEvent");
        let list: EventTypes = serde_json::from_str(r#"["A", "B"]"#).unwrap();
        assert_eq!(list.joined(), "A,B");
    }
}
