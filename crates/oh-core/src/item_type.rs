//! Item types and the data types each of them accepts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::data_type::DataType;

/// Error for an unknown item type name
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{0}' is not a known item type")]
pub struct ItemTypeError(pub String);

/// Item type as declared in the item registry
///
/// `Number` may carry a dimension suffix (`Number:Temperature`); the suffix
/// does not change which literals are accepted and is dropped on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ItemType {
    Switch,
    Contact,
    Dimmer,
    Rollershutter,
    Number,
    String,
    DateTime,
    Color,
    Location,
    Player,
    Image,
    Call,
    Group,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Switch => "Switch",
            ItemType::Contact => "Contact",
            ItemType::Dimmer => "Dimmer",
            ItemType::Rollershutter => "Rollershutter",
            ItemType::Number => "Number",
            ItemType::String => "String",
            ItemType::DateTime => "DateTime",
            ItemType::Color => "Color",
            ItemType::Location => "Location",
            ItemType::Player => "Player",
            ItemType::Image => "Image",
            ItemType::Call => "Call",
            ItemType::Group => "Group",
        }
    }

    /// Data types this item type accepts as states
    ///
    /// A group without a base type accepts any literal.
    pub fn accepted_data_types(&self) -> &'static [DataType] {
        use DataType::*;
        match self {
            ItemType::Switch => &[OnOff, UnDef],
            ItemType::Contact => &[OpenClosed, UnDef],
            ItemType::Dimmer => &[Percent, OnOff, UnDef],
            ItemType::Rollershutter => &[Percent, UpDown, UnDef],
            ItemType::Number => &[Decimal, Quantity, UnDef],
            ItemType::String => &[String, DateTime, UnDef],
            ItemType::DateTime => &[DateTime, UnDef],
            ItemType::Color => &[Hsb, Percent, OnOff, UnDef],
            ItemType::Location => &[Point, UnDef],
            ItemType::Player => &[PlayPause, RewindFastforward, UnDef],
            ItemType::Image => &[Raw, UnDef],
            ItemType::Call => &[StringList, UnDef],
            ItemType::Group => &[String, UnDef],
        }
    }

    /// Data types this item type accepts as commands
    pub fn accepted_command_types(&self) -> &'static [DataType] {
        use DataType::*;
        match self {
            ItemType::Switch => &[OnOff, Refresh],
            ItemType::Contact => &[Refresh],
            ItemType::Dimmer => &[Percent, OnOff, IncreaseDecrease, Refresh],
            ItemType::Rollershutter => &[UpDown, StopMove, Percent, Refresh],
            ItemType::Number => &[Decimal, Quantity, Refresh],
            ItemType::String => &[String, Refresh],
            ItemType::DateTime => &[DateTime, Refresh],
            ItemType::Color => &[Hsb, Percent, OnOff, IncreaseDecrease, Refresh],
            ItemType::Location => &[Point, Refresh],
            ItemType::Player => &[PlayPause, NextPrevious, RewindFastforward, Refresh],
            ItemType::Image | ItemType::Call => &[Refresh],
            ItemType::Group => &[String],
        }
    }
}

impl FromStr for ItemType {
    type Err = ItemTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let base = match s.split_once(':') {
            Some(("Number", _)) => "Number",
            Some(_) => return Err(ItemTypeError(s.to_string())),
            None => s,
        };
        let item_type = match base {
            "Switch" => ItemType::Switch,
            "Contact" => ItemType::Contact,
            "Dimmer" => ItemType::Dimmer,
            "Rollershutter" => ItemType::Rollershutter,
            "Number" => ItemType::Number,
            "String" => ItemType::String,
            "DateTime" => ItemType::DateTime,
            "Color" => ItemType::Color,
            "Location" => ItemType::Location,
            "Player" => ItemType::Player,
            "Image" => ItemType::Image,
            "Call" => ItemType::Call,
            "Group" => ItemType::Group,
            _ => return Err(ItemTypeError(s.to_string())),
        };
        Ok(item_type)
    }
}

impl TryFrom<String> for ItemType {
    type Error = ItemTypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ItemType> for String {
    fn from(t: ItemType) -> String {
        t.as_str().to_string()
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_type() {
        assert_eq!("Switch".parse::<ItemType>().unwrap(), ItemType::Switch);
        assert_eq!(
            "Number:Temperature".parse::<ItemType>().unwrap(),
            ItemType::Number
        );
        assert!("Switch:Power".parse::<ItemType>().is_err());
        assert!("Lamp".parse::<ItemType>().is_err());
    }

    #[test]
    fn test_switch_states_and_commands() {
        let states = ItemType::Switch.accepted_data_types();
        assert!(DataType::parse_any(states, "ON").is_ok());
        assert!(DataType::parse_any(states, "UNDEF").is_ok());
        assert!(DataType::parse_any(states, "REFRESH").is_err());

        let commands = ItemType::Switch.accepted_command_types();
        assert!(DataType::parse_any(commands, "REFRESH").is_ok());
        assert!(DataType::parse_any(commands, "NULL").is_err());
    }

    #[test]
    fn test_rollershutter_commands() {
        let commands = ItemType::Rollershutter.accepted_command_types();
        assert!(DataType::parse_any(commands, "STOP").is_ok());
        assert!(DataType::parse_any(commands, "40").is_ok());
        assert!(DataType::parse_any(commands, "ON").is_err());
    }
}
