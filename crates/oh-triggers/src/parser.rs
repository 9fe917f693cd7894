//! The `when` expression parser
//!
//! [`WhenParser`] owns the registry lookup and configuration and ties the
//! grammar, validator and builders together. Use [`WhenParser::parse`] when
//! the caller wants the error, and [`WhenParser::when`] when a bad
//! expression should only disable the rule it belongs to.

use std::sync::Arc;

use oh_core::{TargetType, TriggerType};
use oh_registries::EntityLookup;
use tracing::{debug, error, warn};

use crate::builder::{Strategy, TriggerBuilder};
use crate::config::WhenConfig;
use crate::error::{InternalError, ParseError, ParseResult};
use crate::grammar;
use crate::spec::TriggerSpec;
use crate::validator::{self, ValidTrigger};

/// Parses `when` expressions against a set of registries
#[derive(Clone)]
pub struct WhenParser {
    lookup: Arc<dyn EntityLookup>,
    config: Arc<WhenConfig>,
}

impl WhenParser {
    /// Create a parser with the default configuration
    pub fn new(lookup: Arc<dyn EntityLookup>) -> Self {
        Self::with_config(lookup, WhenConfig::default())
    }

    pub fn with_config(lookup: Arc<dyn EntityLookup>, config: WhenConfig) -> Self {
        Self {
            lookup,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &WhenConfig {
        &self.config
    }

    /// Parse and validate an expression into a builder
    pub fn plan(&self, expression: &str, name: Option<&str>) -> ParseResult<TriggerBuilder> {
        let state = grammar::parse(expression)?;
        let valid = validator::validate(state, self.lookup.as_ref(), expression)?;
        let strategy = self.strategy(valid, expression)?;
        Ok(TriggerBuilder::new(strategy, name, self.config.clone()))
    }

    /// Parse an expression straight into trigger specs
    pub fn parse(&self, expression: &str) -> ParseResult<Vec<TriggerSpec>> {
        Ok(self.plan(expression, None)?.specs())
    }

    /// Like [`WhenParser::parse`], with an explicit trigger name
    pub fn parse_named(&self, expression: &str, name: &str) -> ParseResult<Vec<TriggerSpec>> {
        Ok(self.plan(expression, Some(name))?.specs())
    }

    /// Builder for an expression, falling back to a poisoned one on bad input
    ///
    /// Grammar and semantic errors are logged and swallowed. Internal errors
    /// are logged and returned.
    pub fn when(&self, expression: &str, name: Option<&str>) -> ParseResult<TriggerBuilder> {
        match self.plan(expression, name) {
            Ok(builder) => Ok(builder),
            Err(e) if e.is_recoverable() => {
                warn!(expression = %expression, reason = %e.reason(), "{}", e);
                Ok(TriggerBuilder::poison())
            }
            Err(e) => {
                error!(expression = %expression, error = ?e, "Failed to build trigger");
                Err(e)
            }
        }
    }

    fn strategy(&self, valid: ValidTrigger, expression: &str) -> ParseResult<Strategy> {
        let internal = |source: InternalError| ParseError::internal(expression, source);
        let ValidTrigger {
            target_type,
            target,
            trigger_type,
            old_state,
            new_state,
            ..
        } = valid;
        let named = (!target.is_empty()).then(|| target.clone());

        let strategy = match (target_type, trigger_type) {
            (TargetType::System, _) => Strategy::System {
                startlevel: self.config.system_started_startlevel,
            },
            (TargetType::Time, Some(TriggerType::Cron(cron))) => Strategy::Cron { expression: cron },
            (TargetType::Channel, _) => Strategy::Channel {
                channel: target,
                event: new_state,
            },
            (TargetType::Item, Some(trigger_type)) if trigger_type.is_lifecycle() => {
                Strategy::ItemEvent {
                    item: named,
                    trigger_type,
                }
            }
            (TargetType::Thing, Some(trigger_type)) if trigger_type.is_lifecycle() => {
                Strategy::ThingEvent {
                    thing: named,
                    trigger_type,
                }
            }
            (TargetType::Item, Some(trigger_type)) => Strategy::ItemState {
                item: target,
                trigger_type,
                old_state,
                new_state,
            },
            (TargetType::Thing, Some(trigger_type)) => Strategy::ThingState {
                thing: target,
                trigger_type,
                old_status: old_state,
                new_status: new_state,
            },
            (group @ (TargetType::MemberOf | TargetType::DescendentOf), Some(trigger_type)) => {
                let members = if group == TargetType::MemberOf {
                    self.lookup.members(&target)
                } else {
                    self.lookup.all_members(&target)
                }
                .map_err(|e| internal(e.into()))?;
                debug!(group = %target, members = members.len(), "Expanding group trigger");
                Strategy::ItemGroup {
                    members: members.iter().map(|m| m.name.clone()).collect(),
                    trigger_type,
                    old_state,
                    new_state,
                }
            }
            (target_type, trigger_type) => {
                return Err(internal(InternalError::Invariant(format!(
                    "no builder for target_type '{}' with trigger_type {:?}",
                    target_type, trigger_type
                ))))
            }
        };
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oh_core::ItemType;
    use oh_registries::{ItemEntry, Registries, RegistryError, RegistryResult, ThingEntry};

    struct BrokenLookup;

    impl EntityLookup for BrokenLookup {
        fn item(&self, _name: &str) -> RegistryResult<Option<Arc<ItemEntry>>> {
            Err(RegistryError::Poisoned("Item"))
        }

        fn thing(&self, _uid: &str) -> RegistryResult<Option<Arc<ThingEntry>>> {
            Err(RegistryError::Poisoned("Thing"))
        }

        fn members(&self, _group: &str) -> RegistryResult<Vec<Arc<ItemEntry>>> {
            Err(RegistryError::Poisoned("Item"))
        }

        fn all_members(&self, _group: &str) -> RegistryResult<Vec<Arc<ItemEntry>>> {
            Err(RegistryError::Poisoned("Item"))
        }
    }

    fn parser() -> WhenParser {
        let registries = Registries::new();
        registries
            .items
            .add(ItemEntry::new("Kitchen_Light", ItemType::Switch))
            .unwrap();
        WhenParser::new(Arc::new(registries))
    }

    #[test]
    fn test_when_poisons_bad_input() {
        let builder = parser().when("Item Garage_Door changed", None).unwrap();
        assert!(builder.is_poisoned());
    }

    #[test]
    fn test_when_propagates_internal_errors() {
        let parser = WhenParser::new(Arc::new(BrokenLookup));
        let err = parser.when("Item Kitchen_Light changed", None).unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_system_startlevel_from_config() {
        let config = WhenConfig {
            system_started_startlevel: 100,
            ..WhenConfig::default()
        };
        let parser = WhenParser::with_config(Arc::new(Registries::new()), config);
        let specs = parser.parse("System started").unwrap();
        assert_eq!(specs[0].configuration["startlevel"], 100);
    }

    #[test]
    fn test_parse_named() {
        let specs = parser()
            .parse_named("Item Kitchen_Light received update", "light-update")
            .unwrap();
        assert_eq!(specs.len(), 1);
        assert!(specs[0].id.starts_with("light-update_"));
        assert_eq!(specs[0].type_code, "core.ItemStateUpdateTrigger");
    }
}
