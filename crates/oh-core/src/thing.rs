//! Thing status values and channel kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error for a status literal outside the thing status vocabulary
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{0}' is not a valid thing status")]
pub struct UnknownThingStatus(pub String);

/// Lifecycle status of a thing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThingStatus {
    #[default]
    Uninitialized,
    Initializing,
    Unknown,
    Online,
    Offline,
    Removing,
    Removed,
}

impl ThingStatus {
    pub const ALL: [ThingStatus; 7] = [
        ThingStatus::Uninitialized,
        ThingStatus::Initializing,
        ThingStatus::Unknown,
        ThingStatus::Online,
        ThingStatus::Offline,
        ThingStatus::Removing,
        ThingStatus::Removed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThingStatus::Uninitialized => "UNINITIALIZED",
            ThingStatus::Initializing => "INITIALIZING",
            ThingStatus::Unknown => "UNKNOWN",
            ThingStatus::Online => "ONLINE",
            ThingStatus::Offline => "OFFLINE",
            ThingStatus::Removing => "REMOVING",
            ThingStatus::Removed => "REMOVED",
        }
    }
}

impl FromStr for ThingStatus {
    type Err = UnknownThingStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownThingStatus(s.to_string()))
    }
}

impl fmt::Display for ThingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a channel carries state or fires trigger events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    State,
    Trigger,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::State => f.write_str("STATE"),
            ChannelKind::Trigger => f.write_str("TRIGGER"),
        }
    }
}
