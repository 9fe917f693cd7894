//! openHAB rules
//!
//! This crate provides the rule layer on top of the `when` parser:
//! - [`RuleDefinition`]: fluent builder that trigger builders attach to
//! - [`RuleManager`]: registration pass that skips rules with rejected
//!   triggers, plus enable/disable/remove/reload
//! - Rule and registry files in YAML

pub mod config;
pub mod definition;
pub mod error;
pub mod manager;

pub use config::{load_registries, load_rules, RuleConfig, RulesFile, TriggerConfig};
pub use definition::RuleDefinition;
pub use error::{ConfigError, ConfigResult, RuleError, RuleResult};
pub use manager::{LoadReport, Rule, RuleManager};
