//! Command-line arguments for `when-check`

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parse `when` trigger expressions and check rules files
#[derive(Parser, Debug)]
#[command(name = "when-check", version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "warn", env = "WHEN_CHECK_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Registry snapshot (YAML) to validate against
    #[arg(short, long, env = "WHEN_CHECK_REGISTRY", global = true)]
    pub registry: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Parse one expression and print the trigger specs as JSON
    Parse {
        /// The expression, e.g. "Item Kitchen_Light changed to ON"
        expression: String,

        /// Explicit trigger name used for the ids
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Register every rule in a rules file and report which were skipped
    Check {
        /// Rules file (YAML)
        rules: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        let cli = Cli::try_parse_from([
            "when-check",
            "parse",
            "Item Kitchen_Light changed",
            "--name",
            "light",
            "--registry",
            "registry.yaml",
        ])
        .unwrap();

        assert_eq!(cli.registry, Some(PathBuf::from("registry.yaml")));
        match cli.command {
            Commands::Parse { expression, name } => {
                assert_eq!(expression, "Item Kitchen_Light changed");
                assert_eq!(name.as_deref(), Some("light"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_check_command() {
        let cli = Cli::try_parse_from(["when-check", "-l", "debug", "check", "rules.yaml"]).unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Check { rules } if rules == PathBuf::from("rules.yaml")));
    }

    #[test]
    fn test_command_required() {
        assert!(Cli::try_parse_from(["when-check"]).is_err());
    }
}
