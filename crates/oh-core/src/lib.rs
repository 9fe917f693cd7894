//! Core types for openHAB rule triggers
//!
//! This crate provides the fundamental value types shared by the registry,
//! the `when` expression parser and the rule layer: target and trigger
//! vocabularies, item data types with their state/command parser, thing
//! status values, channel kinds and trigger uid sanitizing.

mod data_type;
mod item_type;
mod target;
mod thing;
mod uid;

pub use data_type::{DataType, ValueError, ValueResult};
pub use item_type::{ItemType, ItemTypeError};
pub use target::{TargetType, TriggerType, UnknownTargetType};
pub use thing::{ChannelKind, ThingStatus, UnknownThingStatus};
pub use uid::{validate_uid, UID_PREFIX};

/// Default namespace for generic event topics and sources
pub const EVENT_NAMESPACE: &str = "openhab";

/// Start level at which rules have been loaded
pub const STARTLEVEL_RULES_LOADED: u32 = 40;

/// Trigger type codes understood by the automation engine
pub mod type_codes {
    /// Item state changed
    pub const ITEM_STATE_CHANGE: &str = "core.ItemStateChangeTrigger";

    /// Item state updated (changed or not)
    pub const ITEM_STATE_UPDATE: &str = "core.ItemStateUpdateTrigger";

    /// Item received a command
    pub const ITEM_COMMAND: &str = "core.ItemCommandTrigger";

    /// Any event on the event bus, filtered by topic/source/type
    pub const GENERIC_EVENT: &str = "core.GenericEventTrigger";

    /// Thing status changed
    pub const THING_STATUS_CHANGE: &str = "core.ThingStatusChangeTrigger";

    /// Thing status updated
    pub const THING_STATUS_UPDATE: &str = "core.ThingStatusUpdateTrigger";

    /// Trigger channel fired
    pub const CHANNEL_EVENT: &str = "core.ChannelEventTrigger";

    /// Quartz cron schedule
    pub const GENERIC_CRON: &str = "timer.GenericCronTrigger";

    /// System reached a start level
    pub const SYSTEM_STARTLEVEL: &str = "core.SystemStartlevelTrigger";

    /// All known type codes
    pub const ALL: &[&str] = &[
        ITEM_STATE_CHANGE,
        ITEM_STATE_UPDATE,
        ITEM_COMMAND,
        GENERIC_EVENT,
        THING_STATUS_CHANGE,
        THING_STATUS_UPDATE,
        CHANNEL_EVENT,
        GENERIC_CRON,
        SYSTEM_STARTLEVEL,
    ];
}

/// Event type names carried by registry lifecycle events
pub mod event_types {
    pub const ITEM_ADDED: &str = "ItemAddedEvent";
    pub const ITEM_REMOVED: &str = "ItemRemovedEvent";
    pub const ITEM_UPDATED: &str = "ItemUpdatedEvent";
    pub const THING_ADDED: &str = "ThingAddedEvent";
    pub const THING_REMOVED: &str = "ThingRemovedEvent";
    pub const THING_UPDATED: &str = "ThingUpdatedEvent";
}
