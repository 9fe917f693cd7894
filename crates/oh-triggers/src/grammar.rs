//! Tokenizer and grammar state machine
//!
//! An expression is split on whitespace and consumed left to right into five
//! slots. Slots fill in a fixed order (target type, target, trigger type,
//! then old/new state) and are written at most once.

use std::collections::VecDeque;

use oh_core::{TargetType, TriggerType};

use crate::cron;
use crate::error::{InternalError, ParseError, ParseResult};

/// Transient state of one parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseState {
    tokens: VecDeque<String>,
    pub target_type: Option<String>,
    pub trigger_target: Option<String>,
    pub trigger_type: Option<TriggerType>,
    pub old_state: Option<String>,
    pub new_state: Option<String>,
}

fn fill<T>(slot: &mut Option<T>, value: T, name: &str) -> Result<(), InternalError> {
    if slot.is_some() {
        return Err(InternalError::Invariant(format!("{name} is already set")));
    }
    *slot = Some(value);
    Ok(())
}

impl ParseState {
    fn new(tokens: VecDeque<String>) -> Self {
        Self {
            tokens,
            ..Self::default()
        }
    }

    /// Target type, if it is one of the known phrases
    pub fn target(&self) -> Option<TargetType> {
        self.target_type.as_deref().and_then(|t| t.parse().ok())
    }

    /// First `n` remaining tokens joined by a space
    fn peek(&self, n: usize) -> String {
        self.tokens
            .iter()
            .take(n)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Remove and join the first `n` tokens
    fn take(&mut self, n: usize) -> String {
        let taken: Vec<String> = self.tokens.drain(..n.min(self.tokens.len())).collect();
        taken.join(" ")
    }

    fn rest(&self) -> String {
        self.peek(self.tokens.len())
    }
}

/// Run the grammar over an expression
pub fn parse(expression: &str) -> ParseResult<ParseState> {
    let trimmed = expression.trim();
    let grammar = |reason: String| ParseError::grammar(expression, reason);
    let internal = |source: InternalError| ParseError::internal(expression, source);

    if trimmed.is_empty() {
        return Err(grammar("the expression is empty".to_string()));
    }

    // A bare cron expression stands for `Time cron <expression>`
    if cron::is_valid(trimmed) {
        return Ok(ParseState {
            target_type: Some(TargetType::Time.as_str().to_string()),
            trigger_target: Some("cron".to_string()),
            trigger_type: Some(TriggerType::Cron(trimmed.to_string())),
            ..ParseState::default()
        });
    }

    let tokens: VecDeque<String> = trimmed.split_whitespace().map(String::from).collect();

    // A bare item name stands for `Item <name> changed`
    if tokens.len() == 1 {
        return Ok(ParseState {
            target_type: Some(TargetType::Item.as_str().to_string()),
            trigger_target: Some(trimmed.to_string()),
            trigger_type: Some(TriggerType::Changed),
            ..ParseState::default()
        });
    }

    let mut state = ParseState::new(tokens);
    while !state.tokens.is_empty() {
        if state.target_type.is_none() {
            target_type_phase(&mut state).map_err(internal)?;
        } else if state.trigger_target.is_none() {
            trigger_target_phase(&mut state).map_err(internal)?;
        } else if state.trigger_type.is_none() {
            trigger_type_phase(&mut state, expression)?;
        } else {
            qualifier_phase(&mut state, expression)?;
        }
    }
    Ok(state)
}

fn target_type_phase(state: &mut ParseState) -> Result<(), InternalError> {
    let pair = state.peek(2);
    let count = if pair == TargetType::MemberOf.as_str() || pair == TargetType::DescendentOf.as_str()
    {
        2
    } else {
        1
    };
    let target_type = state.take(count);
    fill(&mut state.target_type, target_type, "target_type")
}

fn trigger_target_phase(state: &mut ParseState) -> Result<(), InternalError> {
    let remaining = state.tokens.len();
    let target = match state.target() {
        Some(TargetType::System) if remaining > 1 => {
            if state.peek(2) == "shuts down" {
                state.take(2)
            } else {
                state.take(1)
            }
        }
        // Only the entity type was given (`Item added`)
        Some(TargetType::Item | TargetType::Thing) if remaining == 1 => String::new(),
        _ => state.take(1),
    };
    fill(&mut state.trigger_target, target, "trigger_target")
}

fn trigger_type_phase(state: &mut ParseState, expression: &str) -> ParseResult<()> {
    let target_name = state.target_type.clone().unwrap_or_default();
    let Some(target) = state.target() else {
        return Err(ParseError::grammar(
            expression,
            format!("target_type '{target_name}' is invalid"),
        ));
    };
    let not_permitted = |keyword: &str| {
        ParseError::grammar(
            expression,
            format!("trigger_type '{keyword}' is not valid for target_type '{target_name}'"),
        )
    };

    let pair = state.peek(2);
    let first = state.peek(1);
    let (trigger_type, count) = if TriggerType::PHRASES.contains(&pair.as_str()) {
        let trigger_type = TriggerType::from_keyword(&pair).ok_or_else(|| not_permitted(&pair))?;
        (trigger_type, 2)
    } else if let Some(trigger_type) = TriggerType::from_keyword(&first) {
        (trigger_type, 1)
    } else if target == TargetType::Time && state.trigger_target.as_deref() == Some("cron") {
        let rest = state.rest();
        cron::validate(&rest).map_err(|e| {
            ParseError::grammar(
                expression,
                format!("'{rest}' is not a valid cron expression ({e})"),
            )
        })?;
        (TriggerType::Cron(rest), state.tokens.len())
    } else {
        return Err(ParseError::grammar(
            expression,
            format!("trigger_type '{first}' is invalid"),
        ));
    };

    if !trigger_type.permitted_for(target) {
        return Err(not_permitted(trigger_type.as_str()));
    }

    state.take(count);
    fill(&mut state.trigger_type, trigger_type, "trigger_type")
        .map_err(|e| ParseError::internal(expression, e))
}

fn qualifier_phase(state: &mut ParseState, expression: &str) -> ParseResult<()> {
    let leftover = |state: &ParseState| {
        ParseError::grammar(
            expression,
            format!("'{}' could not be parsed", state.rest()),
        )
    };

    let is_changed = state.trigger_type == Some(TriggerType::Changed);
    let takes_bare_value = matches!(
        state.trigger_type,
        Some(TriggerType::ReceivedUpdate | TriggerType::ReceivedCommand)
    ) || state.target() == Some(TargetType::Channel);

    let first = state.peek(1);
    match first.as_str() {
        "from" | "to" if is_changed => {
            let Some(value) = state.tokens.get(1).cloned() else {
                return Err(ParseError::grammar(
                    expression,
                    format!("'{first}' must be followed by a state"),
                ));
            };
            let filled = if first == "from" {
                state.old_state.is_some()
            } else {
                state.new_state.is_some()
            };
            if filled {
                return Err(leftover(state));
            }
            state.take(2);
            if first == "from" {
                state.old_state = Some(value);
            } else {
                state.new_state = Some(value);
            }
        }
        _ if takes_bare_value && state.new_state.is_none() => {
            state.new_state = Some(state.take(1));
        }
        _ => return Err(leftover(state)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(expr: &str) -> (String, String, String, Option<String>, Option<String>) {
        let state = parse(expr).unwrap();
        (
            state.target_type.unwrap(),
            state.trigger_target.unwrap(),
            state.trigger_type.map(|t| t.to_string()).unwrap_or_default(),
            state.old_state,
            state.new_state,
        )
    }

    fn grammar_reason(expr: &str) -> String {
        match parse(expr).unwrap_err() {
            ParseError::Grammar { reason, .. } => reason,
            other => panic!("expected grammar error, got {other:?}"),
        }
    }

    #[test]
    fn test_changed_from_to() {
        assert_eq!(
            slots("Item gMotion_Sensors changed from ON to OFF"),
            (
                "Item".into(),
                "gMotion_Sensors".into(),
                "changed".into(),
                Some("ON".into()),
                Some("OFF".into())
            )
        );
        // Qualifiers may come in either order
        let (_, _, _, old, new) = slots("Item Door changed to OPEN from CLOSED");
        assert_eq!(old.as_deref(), Some("CLOSED"));
        assert_eq!(new.as_deref(), Some("OPEN"));
    }

    #[test]
    fn test_two_word_target_types() {
        let (target_type, target, trigger, _, _) = slots("Member of gContact_Sensors changed");
        assert_eq!(target_type, "Member of");
        assert_eq!(target, "gContact_Sensors");
        assert_eq!(trigger, "changed");

        let (target_type, _, trigger, _, new) =
            slots("Descendent of gLights received command ON");
        assert_eq!(target_type, "Descendent of");
        assert_eq!(trigger, "received command");
        assert_eq!(new.as_deref(), Some("ON"));
    }

    #[test]
    fn test_single_word_shortcut() {
        assert_eq!(
            slots("Kitchen_Light"),
            (
                "Item".into(),
                "Kitchen_Light".into(),
                "changed".into(),
                None,
                None
            )
        );
    }

    #[test]
    fn test_entity_type_only() {
        let (target_type, target, trigger, _, _) = slots("Item added");
        assert_eq!((target_type.as_str(), target.as_str()), ("Item", ""));
        assert_eq!(trigger, "added");

        let (_, target, trigger, _, _) = slots("Thing removed");
        assert_eq!((target.as_str(), trigger.as_str()), ("", "removed"));
    }

    #[test]
    fn test_cron() {
        let (target_type, target, trigger, _, _) = slots("Time cron 55 55 5 * * ?");
        assert_eq!((target_type.as_str(), target.as_str()), ("Time", "cron"));
        assert_eq!(trigger, "55 55 5 * * ?");

        // Bare cron expression
        let (target_type, _, trigger, _, _) = slots("0 0/5 * * * ?");
        assert_eq!(target_type, "Time");
        assert_eq!(trigger, "0 0/5 * * * ?");

        assert!(grammar_reason("Time cron 99 * * * * ?").contains("not a valid cron expression"));
    }

    #[test]
    fn test_system() {
        let (target_type, target, _, _, _) = slots("System started");
        assert_eq!((target_type.as_str(), target.as_str()), ("System", "started"));
        let state = parse("System shuts down").unwrap();
        assert_eq!(state.trigger_target.as_deref(), Some("shuts down"));
        assert!(state.trigger_type.is_none());
    }

    #[test]
    fn test_channel_event() {
        let (_, target, trigger, _, new) =
            slots("Channel astro:sun:local:rise#event triggered START");
        assert_eq!(target, "astro:sun:local:rise#event");
        assert_eq!(trigger, "triggered");
        assert_eq!(new.as_deref(), Some("START"));
    }

    #[test]
    fn test_keyword_not_permitted() {
        assert_eq!(
            grammar_reason("Thing kodi:kodi:familyroom received command ON"),
            "trigger_type 'received command' is not valid for target_type 'Thing'"
        );
        assert_eq!(
            grammar_reason("Member of gLights added"),
            "trigger_type 'added' is not valid for target_type 'Member of'"
        );
        assert_eq!(
            grammar_reason("Item Kitchen_Light triggered"),
            "trigger_type 'triggered' is not valid for target_type 'Item'"
        );
    }

    #[test]
    fn test_unknown_keyword() {
        assert_eq!(
            grammar_reason("Item Kitchen_Light flipped"),
            "trigger_type 'flipped' is invalid"
        );
    }

    #[test]
    fn test_leftovers() {
        assert_eq!(
            grammar_reason("Item Kitchen_Light changed sometimes"),
            "'sometimes' could not be parsed"
        );
        assert_eq!(
            grammar_reason("Item Kitchen_Light received update ON OFF"),
            "'OFF' could not be parsed"
        );
        assert_eq!(
            grammar_reason("Item Kitchen_Light changed from ON from OFF"),
            "'from OFF' could not be parsed"
        );
        assert_eq!(
            grammar_reason("Item Kitchen_Light changed to"),
            "'to' must be followed by a state"
        );
    }

    #[test]
    fn test_unknown_target_type() {
        assert_eq!(
            grammar_reason("Group gLights changed"),
            "target_type 'Group' is invalid"
        );
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(grammar_reason("   "), "the expression is empty");
    }
}
