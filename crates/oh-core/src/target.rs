//! Target and trigger vocabularies of `when` expressions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error for a target type outside the closed vocabulary
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{0}' is not a valid target type")]
pub struct UnknownTargetType(pub String);

/// What a `when` expression points at
///
/// The target type decides which trigger keywords are allowed after it and
/// which registry checks apply during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    Item,
    #[serde(rename = "Member of")]
    MemberOf,
    #[serde(rename = "Descendent of")]
    DescendentOf,
    Thing,
    Channel,
    System,
    Time,
}

impl TargetType {
    /// All target types, in vocabulary order
    pub const ALL: [TargetType; 7] = [
        TargetType::Item,
        TargetType::MemberOf,
        TargetType::DescendentOf,
        TargetType::Thing,
        TargetType::Channel,
        TargetType::System,
        TargetType::Time,
    ];

    /// The phrase used in expressions
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Item => "Item",
            TargetType::MemberOf => "Member of",
            TargetType::DescendentOf => "Descendent of",
            TargetType::Thing => "Thing",
            TargetType::Channel => "Channel",
            TargetType::System => "System",
            TargetType::Time => "Time",
        }
    }

    /// Whether this target fans out over the members of a group
    pub fn is_group(&self) -> bool {
        matches!(self, TargetType::MemberOf | TargetType::DescendentOf)
    }

    /// Whether this target refers to items (directly or through a group)
    pub fn is_item_like(&self) -> bool {
        matches!(
            self,
            TargetType::Item | TargetType::MemberOf | TargetType::DescendentOf
        )
    }
}

impl FromStr for TargetType {
    type Err = UnknownTargetType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTargetType(s.to_string()))
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The event a `when` expression waits for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerType {
    Changed,
    ReceivedUpdate,
    ReceivedCommand,
    Added,
    Removed,
    Modified,
    Triggered,
    /// Raw Quartz cron expression
    Cron(String),
}

impl TriggerType {
    /// Two-word keywords, checked before single words
    pub const PHRASES: [&'static str; 2] = ["received update", "received command"];

    /// Look up a keyword (one or two words); cron expressions are not keywords
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "changed" => Some(TriggerType::Changed),
            "received update" => Some(TriggerType::ReceivedUpdate),
            "received command" => Some(TriggerType::ReceivedCommand),
            "added" => Some(TriggerType::Added),
            "removed" => Some(TriggerType::Removed),
            "modified" => Some(TriggerType::Modified),
            "triggered" => Some(TriggerType::Triggered),
            _ => None,
        }
    }

    /// Keyword text, or the cron expression itself
    pub fn as_str(&self) -> &str {
        match self {
            TriggerType::Changed => "changed",
            TriggerType::ReceivedUpdate => "received update",
            TriggerType::ReceivedCommand => "received command",
            TriggerType::Added => "added",
            TriggerType::Removed => "removed",
            TriggerType::Modified => "modified",
            TriggerType::Triggered => "triggered",
            TriggerType::Cron(expr) => expr,
        }
    }

    /// Registry lifecycle events (`added`, `removed`, `modified`)
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            TriggerType::Added | TriggerType::Removed | TriggerType::Modified
        )
    }

    /// Whether the keyword may follow the given target type
    pub fn permitted_for(&self, target: TargetType) -> bool {
        use TargetType::*;
        match self {
            TriggerType::Changed | TriggerType::ReceivedUpdate => {
                matches!(target, Item | Thing | MemberOf | DescendentOf)
            }
            TriggerType::ReceivedCommand => matches!(target, Item | MemberOf | DescendentOf),
            TriggerType::Added | TriggerType::Removed | TriggerType::Modified => {
                matches!(target, Item | Thing)
            }
            TriggerType::Triggered => target == Channel,
            TriggerType::Cron(_) => target == Time,
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_type_roundtrip() {
        for target in TargetType::ALL {
            assert_eq!(target.as_str().parse::<TargetType>().unwrap(), target);
        }
        assert_eq!(
            "Group".parse::<TargetType>().unwrap_err(),
            UnknownTargetType("Group".to_string())
        );
    }

    #[test]
    fn test_target_type_serde() {
        let json = serde_json::to_string(&TargetType::MemberOf).unwrap();
        assert_eq!(json, "\"Member of\"");
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            TriggerType::from_keyword("received command"),
            Some(TriggerType::ReceivedCommand)
        );
        assert_eq!(TriggerType::from_keyword("received"), None);
        assert!(TriggerType::Added.is_lifecycle());
        assert!(!TriggerType::Changed.is_lifecycle());
    }

    #[test]
    fn test_permissions() {
        assert!(TriggerType::Changed.permitted_for(TargetType::DescendentOf));
        assert!(!TriggerType::ReceivedCommand.permitted_for(TargetType::Thing));
        assert!(!TriggerType::Added.permitted_for(TargetType::MemberOf));
        assert!(TriggerType::Triggered.permitted_for(TargetType::Channel));
        assert!(!TriggerType::Changed.permitted_for(TargetType::Channel));
        assert!(TriggerType::Cron("0 * * * * ?".into()).permitted_for(TargetType::Time));
    }
}
