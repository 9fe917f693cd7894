//! `when` trigger expressions
//!
//! This crate turns phrases such as `"Item gMotion_Sensors changed from ON
//! to OFF"` into trigger specs for the automation engine:
//! - [`grammar`]: tokenizer and slot-filling state machine
//! - [`validator`]: checks against the item and thing registries
//! - [`builder`]: one strategy per target/trigger combination, including
//!   group fan-out and the poisoned builder for rejected expressions
//! - [`parser`]: [`WhenParser`], the entry point
//!
//! Quartz cron validation and the [`TriggerFactory`] seam live here too.

pub mod builder;
pub mod config;
pub mod cron;
pub mod error;
pub mod factory;
pub mod grammar;
pub mod parser;
pub mod spec;
pub mod validator;

pub use builder::{Strategy, TriggerBuilder, TriggerSlot, TriggerTarget};
pub use config::WhenConfig;
pub use cron::CronError;
pub use error::{InternalError, ParseError, ParseResult};
pub use factory::{DefaultTriggerFactory, FactoryError, FactoryResult, TriggerFactory, TriggerHandle};
pub use parser::WhenParser;
pub use spec::{Configuration, EventTypes, TriggerSpec};
pub use validator::ValidTrigger;
