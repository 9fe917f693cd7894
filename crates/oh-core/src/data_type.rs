//! Data types that items accept as states and commands
//!
//! A state or command literal in a `when` expression is valid for an item
//! when at least one of the item's accepted data types can parse it.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Error for a literal no accepted data type can parse
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("'{literal}' is not a valid {data_type}")]
    InvalidLiteral { data_type: DataType, literal: String },

    #[error("'{literal}' is not accepted by any of [{accepted}]")]
    NotAccepted { literal: String, accepted: String },
}

/// Result type for literal parsing
pub type ValueResult<T> = Result<T, ValueError>;

/// A typed value family, named after the automation engine's type classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    OnOff,
    OpenClosed,
    UpDown,
    StopMove,
    IncreaseDecrease,
    PlayPause,
    NextPrevious,
    RewindFastforward,
    Refresh,
    UnDef,
    Decimal,
    Quantity,
    Percent,
    Hsb,
    DateTime,
    Point,
    String,
    StringList,
    Raw,
}

impl DataType {
    /// Type class name
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::OnOff => "OnOffType",
            DataType::OpenClosed => "OpenClosedType",
            DataType::UpDown => "UpDownType",
            DataType::StopMove => "StopMoveType",
            DataType::IncreaseDecrease => "IncreaseDecreaseType",
            DataType::PlayPause => "PlayPauseType",
            DataType::NextPrevious => "NextPreviousType",
            DataType::RewindFastforward => "RewindFastforwardType",
            DataType::Refresh => "RefreshType",
            DataType::UnDef => "UnDefType",
            DataType::Decimal => "DecimalType",
            DataType::Quantity => "QuantityType",
            DataType::Percent => "PercentType",
            DataType::Hsb => "HSBType",
            DataType::DateTime => "DateTimeType",
            DataType::Point => "PointType",
            DataType::String => "StringType",
            DataType::StringList => "StringListType",
            DataType::Raw => "RawType",
        }
    }

    /// Keyword literals for enum-like types
    fn keywords(&self) -> Option<&'static [&'static str]> {
        let words: &'static [&'static str] = match self {
            DataType::OnOff => &["ON", "OFF"],
            DataType::OpenClosed => &["OPEN", "CLOSED"],
            DataType::UpDown => &["UP", "DOWN"],
            DataType::StopMove => &["STOP", "MOVE"],
            DataType::IncreaseDecrease => &["INCREASE", "DECREASE"],
            DataType::PlayPause => &["PLAY", "PAUSE"],
            DataType::NextPrevious => &["NEXT", "PREVIOUS"],
            DataType::RewindFastforward => &["REWIND", "FASTFORWARD"],
            DataType::Refresh => &["REFRESH"],
            DataType::UnDef => &["NULL", "UNDEF"],
            _ => return None,
        };
        Some(words)
    }

    /// Check whether `literal` is a valid value of this type
    pub fn parse(&self, literal: &str) -> ValueResult<()> {
        let valid = match self.keywords() {
            Some(words) => words.contains(&literal),
            None => match self {
                DataType::Decimal => parse_number(literal).is_some(),
                DataType::Quantity => is_quantity(literal),
                DataType::Percent => {
                    parse_number(literal).is_some_and(|v| (0.0..=100.0).contains(&v))
                }
                DataType::Hsb => is_hsb(literal),
                DataType::DateTime => is_date_time(literal),
                DataType::Point => is_point(literal),
                DataType::Raw => literal.starts_with("data:") && literal.contains(";base64,"),
                DataType::String | DataType::StringList => true,
                _ => false,
            },
        };

        if valid {
            Ok(())
        } else {
            Err(ValueError::InvalidLiteral {
                data_type: *self,
                literal: literal.to_string(),
            })
        }
    }

    /// Parse `literal` against a list of types, returning the first that accepts it
    pub fn parse_any(types: &[DataType], literal: &str) -> ValueResult<DataType> {
        types
            .iter()
            .copied()
            .find(|t| t.parse(literal).is_ok())
            .ok_or_else(|| ValueError::NotAccepted {
                literal: literal.to_string(),
                accepted: types
                    .iter()
                    .map(DataType::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_quantity(s: &str) -> bool {
    static QUANTITY: OnceLock<Regex> = OnceLock::new();
    let re = QUANTITY.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?\s*([^\d\s.+-][^\s]*)$")
            .expect("quantity pattern is valid")
    });
    re.is_match(s)
}

fn is_hsb(s: &str) -> bool {
    let parts: Vec<Option<f64>> = s.split(',').map(|p| parse_number(p.trim())).collect();
    match parts.as_slice() {
        [Some(h), Some(sat), Some(b)] => {
            (0.0..=360.0).contains(h)
                && (0.0..=100.0).contains(sat)
                && (0.0..=100.0).contains(b)
        }
        _ => false,
    }
}

fn is_point(s: &str) -> bool {
    let parts: Vec<Option<f64>> = s.split(',').map(|p| parse_number(p.trim())).collect();
    let (lat, lon) = match parts.as_slice() {
        [Some(lat), Some(lon)] | [Some(lat), Some(lon), Some(_)] => (*lat, *lon),
        _ => return false,
    };
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

fn is_date_time(s: &str) -> bool {
    const ZONED: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"];
    const LOCAL: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

    DateTime::parse_from_rfc3339(s).is_ok()
        || ZONED.iter().any(|f| DateTime::parse_from_str(s, f).is_ok())
        || LOCAL.iter().any(|f| NaiveDateTime::parse_from_str(s, f).is_ok())
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
