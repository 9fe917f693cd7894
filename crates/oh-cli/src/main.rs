//! when-check
//!
//! Parses `when` trigger expressions and checks rules files against a
//! registry snapshot.

mod cli;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use oh_registries::{EntityLookup, Registries};
use oh_rules::{load_registries, RuleManager};
use oh_triggers::WhenParser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn registries(path: Option<&Path>) -> Result<Arc<dyn EntityLookup>> {
    let registries = match path {
        Some(path) => load_registries(path)
            .with_context(|| format!("loading registry {}", path.display()))?,
        None => {
            debug!("No registry given, validating against empty registries");
            Registries::new()
        }
    };
    Ok(Arc::new(registries))
}

fn parse(lookup: Arc<dyn EntityLookup>, expression: &str, name: Option<&str>) -> Result<ExitCode> {
    let parser = WhenParser::new(lookup);
    match parser.plan(expression, name) {
        Ok(builder) => {
            println!("{}", serde_json::to_string_pretty(&builder.specs())?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_recoverable() => {
            eprintln!("{e}");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

fn check(lookup: Arc<dyn EntityLookup>, rules: &Path) -> Result<ExitCode> {
    let manager = RuleManager::new();
    let report = manager
        .load_file(rules, lookup)
        .with_context(|| format!("checking {}", rules.display()))?;

    for uid in &report.created {
        if let Some(rule) = manager.get(uid) {
            println!("created  {} ({}, {} triggers)", rule.name, uid, rule.triggers.len());
        }
    }
    for name in &report.skipped {
        println!("skipped  {name}");
    }
    info!(
        "{} rules created, {} skipped",
        report.created.len(),
        report.skipped.len()
    );

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let lookup = registries(cli.registry.as_deref())?;
    match &cli.command {
        Commands::Parse { expression, name } => parse(lookup, expression, name.as_deref()),
        Commands::Check { rules } => check(lookup, rules),
    }
}
