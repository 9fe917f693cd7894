//! Rule and registry files
//!
//! Rules file:
//!
//! ```yaml
//! when:
//!   uid_prefix: trigger
//! rules:
//!   - name: Motion off
//!     tags: [motion]
//!     triggers:
//!       - Item gMotion_Sensors changed from ON to OFF
//!       - expression: Member of gContact_Sensors changed
//!         name: contact-change
//! ```
//!
//! Registry files hold a [`RegistrySnapshot`] (`items:` and `things:`).

use std::fs;
use std::path::Path;

use oh_registries::{Registries, RegistrySnapshot};
use oh_triggers::{ParseResult, WhenConfig, WhenParser};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::definition::RuleDefinition;
use crate::error::{ConfigError, ConfigResult};

/// One trigger entry: a bare expression or an expression with a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerConfig {
    Expression(String),
    Named { expression: String, name: String },
}

impl TriggerConfig {
    pub fn expression(&self) -> &str {
        match self {
            TriggerConfig::Expression(expression) | TriggerConfig::Named { expression, .. } => {
                expression
            }
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            TriggerConfig::Expression(_) => None,
            TriggerConfig::Named { name, .. } => Some(name),
        }
    }
}

/// Rule configuration from YAML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Unique ID (optional, auto-generated if not provided)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
}

impl RuleConfig {
    /// Build the definition, parsing every trigger expression
    ///
    /// Rejected expressions poison the definition; only internal parser
    /// failures are returned as errors.
    pub fn define(&self, parser: &WhenParser) -> ParseResult<RuleDefinition> {
        let mut definition = RuleDefinition::new(&self.name);
        definition.uid = self.uid.clone();
        definition.description = self.description.clone();
        definition.tags = self.tags.clone();

        for trigger in &self.triggers {
            let builder = parser.when(trigger.expression(), trigger.name())?;
            definition = definition.trigger(&builder);
        }
        Ok(definition)
    }
}

/// Contents of a rules file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default)]
    pub when: WhenConfig,

    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn read(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_yaml<T: serde::de::DeserializeOwned>(content: &str, path: &Path) -> ConfigResult<T> {
    // An empty file is an empty document
    let content = if content.trim().is_empty() { "{}" } else { content };
    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load a rules file
pub fn load_rules(path: impl AsRef<Path>) -> ConfigResult<RulesFile> {
    let path = path.as_ref();
    debug!("Loading rules file: {:?}", path);
    let rules: RulesFile = parse_yaml(&read(path)?, path)?;
    debug!("Found {} rules in {:?}", rules.rules.len(), path);
    Ok(rules)
}

/// Load a registry snapshot file into fresh registries
pub fn load_registries(path: impl AsRef<Path>) -> ConfigResult<Registries> {
    let path = path.as_ref();
    debug!("Loading registry file: {:?}", path);
    let snapshot: RegistrySnapshot = parse_yaml(&read(path)?, path)?;
    Registries::from_snapshot(snapshot).map_err(|e| ConfigError::Registry {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_config_forms() {
        let triggers: Vec<TriggerConfig> = serde_yaml::from_str(
            "- Item Kitchen_Light changed\n- expression: System started\n  name: startup\n",
        )
        .unwrap();

        assert_eq!(triggers[0].expression(), "Item Kitchen_Light changed");
        assert_eq!(triggers[0].name(), None);
        assert_eq!(triggers[1].expression(), "System started");
        assert_eq!(triggers[1].name(), Some("startup"));
    }

    #[test]
    fn test_rules_file_defaults() {
        let file: RulesFile = serde_yaml::from_str("rules:\n  - name: Empty\n").unwrap();
        assert_eq!(file.when, WhenConfig::default());
        assert_eq!(file.rules[0].name, "Empty");
        assert!(file.rules[0].triggers.is_empty());
    }

    #[test]
    fn test_empty_document() {
        let file: RulesFile = parse_yaml("", Path::new("rules.yaml")).unwrap();
        assert!(file.rules.is_empty());
    }
}
