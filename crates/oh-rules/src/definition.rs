//! Rule definitions
//!
//! A [`RuleDefinition`] collects metadata and trigger slots before the rule
//! is registered. Trigger builders attach to it through [`TriggerTarget`]:
//!
//! ```ignore
//! let rule = RuleDefinition::new("Motion off")
//!     .describe("Lights out when the hall is empty")
//!     .trigger(&parser.when("Member of gMotion_Sensors changed to OFF", None)?);
//! ```

use oh_triggers::{TriggerBuilder, TriggerSlot, TriggerSpec, TriggerTarget};
use serde::{Deserialize, Serialize};

/// A rule that has not been registered yet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Rule uid (a ULID is assigned at registration when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub triggers: Vec<TriggerSlot>,
}

impl RuleDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Attach the triggers of one expression
    pub fn trigger(self, builder: &TriggerBuilder) -> Self {
        builder.apply(self)
    }

    /// Whether any trigger expression was rejected
    pub fn is_poisoned(&self) -> bool {
        self.triggers.iter().any(TriggerSlot::is_invalid)
    }

    /// The valid trigger specs, in attachment order
    pub fn trigger_specs(&self) -> impl Iterator<Item = &TriggerSpec> {
        self.triggers.iter().filter_map(TriggerSlot::as_spec)
    }
}

impl TriggerTarget for RuleDefinition {
    fn attach(&mut self, slot: TriggerSlot) {
        self.triggers.push(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oh_triggers::{Strategy, WhenConfig};
    use std::sync::Arc;

    fn cron(expression: &str) -> TriggerBuilder {
        TriggerBuilder::new(
            Strategy::Cron {
                expression: expression.to_string(),
            },
            None,
            Arc::new(WhenConfig::default()),
        )
    }

    #[test]
    fn test_triggers_accumulate() {
        let rule = RuleDefinition::new("Twice a day")
            .tag("schedule")
            .trigger(&cron("0 0 8 * * ?"))
            .trigger(&cron("0 0 20 * * ?"));

        assert!(!rule.is_poisoned());
        let expressions: Vec<_> = rule
            .trigger_specs()
            .map(|s| s.config_str("cronExpression").unwrap())
            .collect();
        assert_eq!(expressions, ["0 0 8 * * ?", "0 0 20 * * ?"]);
    }

    #[test]
    fn test_poison_marks_rule() {
        let rule = RuleDefinition::new("Broken")
            .trigger(&cron("0 0 8 * * ?"))
            .trigger(&TriggerBuilder::poison());

        assert!(rule.is_poisoned());
        assert_eq!(rule.trigger_specs().count(), 1);
    }
}
