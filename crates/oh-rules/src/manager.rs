//! Rule registration
//!
//! The [`RuleManager`] turns rule definitions into registered rules. Rules
//! carrying a rejected trigger expression are skipped with a warning, so
//! one bad expression never stops a whole loading pass.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use oh_registries::EntityLookup;
use oh_triggers::{DefaultTriggerFactory, TriggerFactory, TriggerHandle, WhenParser};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::config::{load_rules, RuleConfig};
use crate::definition::RuleDefinition;
use crate::error::{RuleError, RuleResult};

/// A registered rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub uid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub triggers: Vec<TriggerHandle>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome of loading a batch of rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Uids of the rules that were created
    pub created: Vec<String>,

    /// Names of the rules that were not
    pub skipped: Vec<String>,
}

impl LoadReport {
    /// Every rule was created
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Manages all registered rules
pub struct RuleManager {
    /// All rules by uid
    rules: DashMap<String, Rule>,

    factory: Arc<dyn TriggerFactory>,
}

impl RuleManager {
    /// Create a rule manager using the default trigger factory
    pub fn new() -> Self {
        Self::with_factory(Arc::new(DefaultTriggerFactory::new()))
    }

    pub fn with_factory(factory: Arc<dyn TriggerFactory>) -> Self {
        Self {
            rules: DashMap::new(),
            factory,
        }
    }

    /// Register a rule definition, returning its uid
    pub fn register(&self, definition: RuleDefinition) -> RuleResult<String> {
        if definition.is_poisoned() {
            warn!(rule = %definition.name, "rule was not created: invalid trigger");
            return Err(RuleError::InvalidTriggers(definition.name));
        }

        let triggers = definition
            .trigger_specs()
            .map(|spec| self.factory.create(spec))
            .collect::<Result<Vec<_>, _>>()?;

        let uid = definition
            .uid
            .unwrap_or_else(|| Ulid::new().to_string());

        let rule = Rule {
            uid: uid.clone(),
            name: definition.name,
            description: definition.description,
            tags: definition.tags,
            triggers,
            enabled: true,
            created_at: Utc::now(),
        };

        match self.rules.entry(uid.clone()) {
            Entry::Occupied(_) => Err(RuleError::Duplicate(uid)),
            Entry::Vacant(slot) => {
                info!(
                    "Created rule: {} ({}) with {} triggers",
                    rule.name,
                    uid,
                    rule.triggers.len()
                );
                slot.insert(rule);
                Ok(uid)
            }
        }
    }

    /// Define and register rules from configs
    ///
    /// Rules that cannot be created are reported as skipped. Only internal
    /// parser failures abort the pass, before any rule is registered.
    pub fn load(&self, parser: &WhenParser, configs: &[RuleConfig]) -> RuleResult<LoadReport> {
        let definitions = Self::define_all(parser, configs)?;
        Ok(self.register_all(configs, definitions))
    }

    fn define_all(parser: &WhenParser, configs: &[RuleConfig]) -> RuleResult<Vec<RuleDefinition>> {
        let definitions = configs
            .iter()
            .map(|config| config.define(parser))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(definitions)
    }

    fn register_all(&self, configs: &[RuleConfig], definitions: Vec<RuleDefinition>) -> LoadReport {
        let mut report = LoadReport::default();

        for (config, definition) in configs.iter().zip(definitions) {
            match self.register(definition) {
                Ok(uid) => report.created.push(uid),
                // Already logged by register
                Err(RuleError::InvalidTriggers(_)) => report.skipped.push(config.name.clone()),
                Err(e) => {
                    warn!(rule = %config.name, error = %e, "rule was not created");
                    report.skipped.push(config.name.clone());
                }
            }
        }

        debug!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            "Rule loading pass finished"
        );
        report
    }

    /// Load a rules file, parsing triggers against `lookup`
    ///
    /// The file's own `when:` section configures the parser.
    pub fn load_file(
        &self,
        path: impl AsRef<Path>,
        lookup: Arc<dyn EntityLookup>,
    ) -> RuleResult<LoadReport> {
        let file = load_rules(path)?;
        let parser = WhenParser::with_config(lookup, file.when);
        self.load(&parser, &file.rules)
    }

    /// Get a rule by uid
    pub fn get(&self, uid: &str) -> Option<Rule> {
        self.rules.get(uid).map(|r| r.value().clone())
    }

    /// Get all rules
    pub fn all(&self) -> Vec<Rule> {
        self.rules.iter().map(|r| r.value().clone()).collect()
    }

    /// Get rule count
    pub fn count(&self) -> usize {
        self.rules.len()
    }

    /// Enable a rule
    pub fn enable(&self, uid: &str) -> RuleResult<()> {
        self.set_enabled(uid, true)
    }

    /// Disable a rule
    pub fn disable(&self, uid: &str) -> RuleResult<()> {
        self.set_enabled(uid, false)
    }

    fn set_enabled(&self, uid: &str, enabled: bool) -> RuleResult<()> {
        let mut rule = self
            .rules
            .get_mut(uid)
            .ok_or_else(|| RuleError::NotFound(uid.to_string()))?;

        rule.enabled = enabled;
        info!(
            "{} rule: {}",
            if enabled { "Enabled" } else { "Disabled" },
            rule.name
        );
        Ok(())
    }

    /// Remove a rule
    pub fn remove(&self, uid: &str) -> RuleResult<Rule> {
        self.rules
            .remove(uid)
            .map(|(_, r)| r)
            .ok_or_else(|| RuleError::NotFound(uid.to_string()))
    }

    /// Replace all rules with those from configs
    ///
    /// The current rules stay in place when parsing fails.
    pub fn reload(&self, parser: &WhenParser, configs: &[RuleConfig]) -> RuleResult<LoadReport> {
        let definitions = Self::define_all(parser, configs)?;
        self.rules.clear();
        let report = self.register_all(configs, definitions);
        info!("Reloaded {} rules", self.rules.len());
        Ok(report)
    }
}

impl Default for RuleManager {
    fn default() -> Self {
        Self::new()
    }
}
