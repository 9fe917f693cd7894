//! Registry-backed validation of a parsed expression
//!
//! Checks run in a fixed order and the first failure wins. Missing
//! entities and bad vocabulary are grammar errors; a wrong entity type or
//! an invalid state, command or status literal is a semantic error.

use std::str::FromStr;

use oh_core::{ChannelKind, DataType, TargetType, ThingStatus, TriggerType};
use oh_registries::{split_channel_uid, EntityHandle, EntityKind, EntityLookup, EntityRef};

use crate::error::{ParseError, ParseResult};
use crate::grammar::ParseState;

/// A parse that passed every check, with the entity it refers to
#[derive(Debug, Clone, PartialEq)]
pub struct ValidTrigger {
    pub target_type: TargetType,
    pub target: String,
    /// `None` only for `System`
    pub trigger_type: Option<TriggerType>,
    pub old_state: Option<String>,
    pub new_state: Option<String>,
    /// Resolved registry entity, when the check needed one
    pub entity: Option<EntityHandle>,
}

struct Validator<'a> {
    expression: &'a str,
    lookup: &'a dyn EntityLookup,
}

impl<'a> Validator<'a> {
    fn grammar(&self, reason: impl Into<String>) -> ParseError {
        ParseError::grammar(self.expression, reason)
    }

    fn semantic(&self, reason: impl Into<String>) -> ParseError {
        ParseError::semantic(self.expression, reason)
    }

    fn resolve(&self, kind: EntityKind, name: &str) -> ParseResult<EntityHandle> {
        self.lookup
            .resolve(kind, &EntityRef::from(name))
            .map_err(|e| ParseError::internal(self.expression, e))?
            .ok_or_else(|| self.grammar(format!("'{name}' is not in the {}", kind.registry_name())))
    }

    fn check_literal(
        &self,
        types: &[DataType],
        literal: &str,
        what: &str,
        item: &str,
    ) -> ParseResult<()> {
        DataType::parse_any(types, literal)
            .map(|_| ())
            .map_err(|e| self.semantic(format!("'{literal}' is not a valid {what} for item '{item}' ({e})")))
    }

    fn check_status(&self, status: Option<&str>) -> ParseResult<()> {
        match status {
            Some(status) => ThingStatus::from_str(status)
                .map(|_| ())
                .map_err(|e| self.semantic(e.to_string())),
            None => Ok(()),
        }
    }

    fn run(&self, state: ParseState) -> ParseResult<ValidTrigger> {
        let raw_target_type = state.target_type.clone().unwrap_or_default();
        let target_type = TargetType::from_str(&raw_target_type)
            .map_err(|_| self.grammar(format!("target_type '{raw_target_type}' is invalid")))?;
        let target = state.trigger_target.clone().unwrap_or_default();
        let trigger_type = state.trigger_type.clone();

        if trigger_type.is_none() && target_type != TargetType::System {
            return Err(self.grammar("no trigger_type was given"));
        }
        let lifecycle = trigger_type.as_ref().is_some_and(TriggerType::is_lifecycle);

        let mut entity = None;
        match target_type {
            TargetType::Item | TargetType::MemberOf | TargetType::DescendentOf if !lifecycle => {
                let handle = self.resolve(EntityKind::Item, &target)?;
                let item = match handle.as_item() {
                    Some(item) => item.clone(),
                    None => return Err(self.semantic(format!("'{target}' is not an item"))),
                };

                if target_type.is_group() && !item.is_group() {
                    return Err(self.semantic(format!(
                        "'{target}' is not a group item, '{target_type}' needs a group"
                    )));
                }

                if target_type == TargetType::Item {
                    match trigger_type {
                        Some(TriggerType::Changed) => {
                            if let Some(old) = state.old_state.as_deref() {
                                self.check_literal(item.accepted_data_types(), old, "state", &target)?;
                            }
                            if let Some(new) = state.new_state.as_deref() {
                                self.check_literal(item.accepted_data_types(), new, "state", &target)?;
                            }
                        }
                        Some(TriggerType::ReceivedUpdate) => {
                            if let Some(new) = state.new_state.as_deref() {
                                self.check_literal(item.accepted_data_types(), new, "state", &target)?;
                            }
                        }
                        Some(TriggerType::ReceivedCommand) => {
                            if let Some(command) = state.new_state.as_deref() {
                                self.check_literal(
                                    item.accepted_command_types(),
                                    command,
                                    "command",
                                    &target,
                                )?;
                            }
                        }
                        _ => {}
                    }
                }
                entity = Some(handle);
            }
            TargetType::Thing if !lifecycle => {
                entity = Some(self.resolve(EntityKind::Thing, &target)?);
                self.check_status(state.old_state.as_deref())?;
                self.check_status(state.new_state.as_deref())?;
            }
            TargetType::Channel => {
                let Some((thing_uid, channel_id)) = split_channel_uid(&target) else {
                    return Err(self.grammar(format!("'{target}' is not a valid channel UID")));
                };
                let thing = self.resolve(EntityKind::Thing, thing_uid)?;
                let handle = self.lookup
                    .resolve(EntityKind::Channel, &EntityRef::from(target.as_str()))
                    .map_err(|e| ParseError::internal(self.expression, e))?
                    .ok_or_else(|| {
                        self.grammar(format!(
                            "'{channel_id}' is not a channel of '{}'",
                            thing.name()
                        ))
                    })?;
                if let Some((_, channel)) = handle.as_channel() {
                    if channel.kind != ChannelKind::Trigger {
                        return Err(self.semantic(format!(
                            "'{target}' is a {} channel, not a trigger channel",
                            channel.kind
                        )));
                    }
                }
                entity = Some(handle);
            }
            TargetType::System if target != "started" => {
                return Err(self.grammar(format!(
                    "System trigger '{target}' is not supported, only 'started' is"
                )));
            }
            _ => {}
        }

        Ok(ValidTrigger {
            target_type,
            target,
            trigger_type,
            old_state: state.old_state,
            new_state: state.new_state,
            entity,
        })
    }
}

/// Check a parsed expression against the registries
pub fn validate(
    state: ParseState,
    lookup: &dyn EntityLookup,
    expression: &str,
) -> ParseResult<ValidTrigger> {
    Validator { expression, lookup }.run(state)
}
