//! Trigger spec builders
//!
//! A [`TriggerBuilder`] is the plan for one expression: a strategy picked
//! from the target and trigger type, plus the resolved names it needs.
//! Building is deferred so every call produces fresh trigger ids.

use std::sync::Arc;

use oh_core::{event_types, validate_uid, TargetType, TriggerType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::WhenConfig;
use crate::spec::TriggerSpec;

/// One entry in a rule's trigger list
///
/// `Invalid` marks an expression that failed to parse; rules carrying it
/// are skipped at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerSlot {
    Spec(TriggerSpec),
    Invalid,
}

impl TriggerSlot {
    pub fn as_spec(&self) -> Option<&TriggerSpec> {
        match self {
            TriggerSlot::Spec(spec) => Some(spec),
            TriggerSlot::Invalid => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, TriggerSlot::Invalid)
    }
}

/// Anything trigger specs can be attached to
pub trait TriggerTarget {
    /// Append one slot; existing slots are kept
    fn attach(&mut self, slot: TriggerSlot);
}

impl TriggerTarget for Vec<TriggerSlot> {
    fn attach(&mut self, slot: TriggerSlot) {
        self.push(slot);
    }
}

/// What to build, resolved from a validated expression
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Item state, update or command trigger
    ItemState {
        item: String,
        trigger_type: TriggerType,
        old_state: Option<String>,
        new_state: Option<String>,
    },
    /// One item trigger per group member
    ItemGroup {
        members: Vec<String>,
        trigger_type: TriggerType,
        old_state: Option<String>,
        new_state: Option<String>,
    },
    /// Item added, removed or modified; `None` matches every item
    ItemEvent {
        item: Option<String>,
        trigger_type: TriggerType,
    },
    ThingState {
        thing: String,
        trigger_type: TriggerType,
        old_status: Option<String>,
        new_status: Option<String>,
    },
    /// Thing added, removed or modified; `None` matches every thing
    ThingEvent {
        thing: Option<String>,
        trigger_type: TriggerType,
    },
    Channel {
        channel: String,
        event: Option<String>,
    },
    Cron {
        expression: String,
    },
    System {
        startlevel: u32,
    },
    /// Expression was rejected
    Poison,
}

/// Builds the trigger specs for one expression
#[derive(Debug, Clone)]
pub struct TriggerBuilder {
    strategy: Strategy,
    name: Option<String>,
    config: Arc<WhenConfig>,
}

/// Id fragment for a trigger keyword (`received update` -> `received-update`)
fn keyword_id(trigger_type: &TriggerType) -> String {
    trigger_type.as_str().replace(' ', "-")
}

/// Id base for state-like triggers: `<head>-<keyword>[-from-<old>][-to-<new>]`
fn state_id(
    head: &str,
    trigger_type: &TriggerType,
    old_state: Option<&str>,
    new_state: Option<&str>,
) -> String {
    let mut id = format!("{}-{}", head, keyword_id(trigger_type));
    if *trigger_type == TriggerType::Changed {
        if let Some(old) = old_state {
            id.push_str(&format!("-from-{old}"));
        }
        if let Some(new) = new_state {
            id.push_str(&format!("-to-{new}"));
        }
    } else if let Some(value) = new_state {
        id.push_str(&format!("-{value}"));
    }
    id
}

fn item_spec(
    item: &str,
    trigger_type: &TriggerType,
    old_state: Option<&str>,
    new_state: Option<&str>,
    id: String,
) -> TriggerSpec {
    match trigger_type {
        TriggerType::ReceivedUpdate => TriggerSpec::item_state_update(item, new_state, id),
        TriggerType::ReceivedCommand => TriggerSpec::item_command(item, new_state, id),
        _ => TriggerSpec::item_state_change(item, old_state, new_state, id),
    }
}

fn lifecycle_event(target_type: TargetType, trigger_type: &TriggerType) -> &'static str {
    match (target_type, trigger_type) {
        (TargetType::Thing, TriggerType::Added) => event_types::THING_ADDED,
        (TargetType::Thing, TriggerType::Removed) => event_types::THING_REMOVED,
        (TargetType::Thing, _) => event_types::THING_UPDATED,
        (_, TriggerType::Added) => event_types::ITEM_ADDED,
        (_, TriggerType::Removed) => event_types::ITEM_REMOVED,
        (_, _) => event_types::ITEM_UPDATED,
    }
}

impl TriggerBuilder {
    pub fn new(strategy: Strategy, name: Option<&str>, config: Arc<WhenConfig>) -> Self {
        Self {
            strategy,
            name: name.map(String::from),
            config,
        }
    }

    /// Builder that marks its target invalid
    pub fn poison() -> Self {
        Self::new(Strategy::Poison, None, Arc::new(WhenConfig::default()))
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn is_poisoned(&self) -> bool {
        self.strategy == Strategy::Poison
    }

    fn uid(&self, base: &str) -> String {
        let base = self.name.as_deref().unwrap_or(base);
        validate_uid(base, &self.config.uid_prefix)
    }

    fn lifecycle_spec(
        &self,
        target_type: TargetType,
        name: Option<&str>,
        trigger_type: &TriggerType,
    ) -> TriggerSpec {
        let collection = if target_type == TargetType::Thing {
            "things"
        } else {
            "items"
        };
        let (source_path, base) = match name {
            Some(name) => (
                format!("{collection}/{name}"),
                format!("{}-{}-{}", target_type, name, trigger_type),
            ),
            None => (
                collection.to_string(),
                format!("{}-{}", target_type, trigger_type),
            ),
        };
        TriggerSpec::generic_event(
            &self.config.event_namespace,
            &source_path,
            lifecycle_event(target_type, trigger_type),
            self.uid(&base),
        )
    }

    /// Build the specs with freshly generated ids
    ///
    /// Empty for a poisoned builder.
    pub fn specs(&self) -> Vec<TriggerSpec> {
        let specs = match &self.strategy {
            Strategy::ItemState {
                item,
                trigger_type,
                old_state,
                new_state,
            } => {
                let base = state_id(
                    &format!("Item-{item}"),
                    trigger_type,
                    old_state.as_deref(),
                    new_state.as_deref(),
                );
                vec![item_spec(
                    item,
                    trigger_type,
                    old_state.as_deref(),
                    new_state.as_deref(),
                    self.uid(&base),
                )]
            }
            Strategy::ItemGroup {
                members,
                trigger_type,
                old_state,
                new_state,
            } => members
                .iter()
                .map(|member| {
                    // An explicit name is shared, so the member keeps ids apart
                    let base = match &self.name {
                        Some(name) => format!("{name}-{member}"),
                        None => state_id(
                            &format!("Item-{member}"),
                            trigger_type,
                            old_state.as_deref(),
                            new_state.as_deref(),
                        ),
                    };
                    item_spec(
                        member,
                        trigger_type,
                        old_state.as_deref(),
                        new_state.as_deref(),
                        validate_uid(&base, &self.config.uid_prefix),
                    )
                })
                .collect(),
            Strategy::ItemEvent { item, trigger_type } => {
                vec![self.lifecycle_spec(TargetType::Item, item.as_deref(), trigger_type)]
            }
            Strategy::ThingState {
                thing,
                trigger_type,
                old_status,
                new_status,
            } => {
                let base = state_id(
                    &format!("Thing-{thing}"),
                    trigger_type,
                    old_status.as_deref(),
                    new_status.as_deref(),
                );
                let id = self.uid(&base);
                let spec = match trigger_type {
                    TriggerType::ReceivedUpdate => {
                        TriggerSpec::thing_status_update(thing, new_status.as_deref(), id)
                    }
                    _ => TriggerSpec::thing_status_change(
                        thing,
                        old_status.as_deref(),
                        new_status.as_deref(),
                        id,
                    ),
                };
                vec![spec]
            }
            Strategy::ThingEvent {
                thing,
                trigger_type,
            } => vec![self.lifecycle_spec(TargetType::Thing, thing.as_deref(), trigger_type)],
            Strategy::Channel { channel, event } => {
                let mut base = format!("Channel-{channel}-triggered");
                if let Some(event) = event {
                    base.push_str(&format!("-{event}"));
                }
                vec![TriggerSpec::channel_event(
                    channel,
                    event.as_deref(),
                    self.uid(&base),
                )]
            }
            Strategy::Cron { expression } => {
                vec![TriggerSpec::cron(
                    expression,
                    self.uid(&format!("Time-cron-{expression}")),
                )]
            }
            Strategy::System { startlevel } => {
                vec![TriggerSpec::system_startlevel(
                    *startlevel,
                    self.uid("System-started"),
                )]
            }
            Strategy::Poison => Vec::new(),
        };

        for spec in &specs {
            debug!(id = %spec.id, type_code = %spec.type_code, "Created trigger");
        }
        specs
    }

    /// Attach this builder's triggers to `target` and hand it back
    ///
    /// A poisoned builder attaches a single [`TriggerSlot::Invalid`].
    pub fn apply<T: TriggerTarget>(&self, mut target: T) -> T {
        if self.is_poisoned() {
            target.attach(TriggerSlot::Invalid);
            return target;
        }
        for spec in self.specs() {
            target.attach(TriggerSlot::Spec(spec));
        }
        target
    }
}
