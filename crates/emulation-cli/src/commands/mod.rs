//! CLI command definitions and dispatch.

pub mod generate;
pub mod plan;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use emulation_common::config::EmulationSettings;
use emulation_common::constants::SETTINGS_FILE_ENV_VAR;

/// Generates docker-compose files for emulated robot fleets.
#[derive(Parser, Debug)]
#[command(name = "em", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the emulation settings JSON file.
    #[arg(long, global = true, env = SETTINGS_FILE_ENV_VAR)]
    pub settings: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the compose file of a fleet definition.
    Generate(generate::GenerateArgs),
    /// Show the services a fleet definition assembles to.
    Plan(plan::PlanArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded or the command fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(cli.settings.as_deref())?;
    match cli.command {
        Command::Generate(args) => generate::execute(&args, &settings),
        Command::Plan(args) => plan::execute(&args, &settings),
    }
}

/// Loads settings from `path`, or the built-in defaults without one.
///
/// # Errors
///
/// Returns an error if the settings file cannot be read or parsed.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<EmulationSettings> {
    match path {
        Some(path) => EmulationSettings::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => {
            tracing::debug!("no settings file given, using defaults");
            Ok(EmulationSettings::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags_parse() {
        let cli = Cli::try_parse_from([
            "em",
            "generate",
            "fleet.yaml",
            "--dev",
            "-o",
            "docker-compose.yaml",
            "--settings",
            "settings.json",
        ])
        .expect("should parse");
        assert_eq!(cli.settings.as_deref(), Some(Path::new("settings.json")));
        match cli.command {
            Command::Generate(args) => {
                assert!(args.dev);
                assert_eq!(args.config, PathBuf::from("fleet.yaml"));
                assert_eq!(args.output, Some(PathBuf::from("docker-compose.yaml")));
            }
            Command::Plan(_) => panic!("expected generate"),
        }
    }

    #[test]
    fn missing_settings_file_fails() {
        let err = load_settings(Some(Path::new("/nonexistent/settings.json")))
            .expect_err("should fail");
        assert!(err.to_string().contains("failed to load settings"));
    }

    #[test]
    fn defaults_without_settings_file() {
        let settings = load_settings(None).expect("defaults");
        assert_eq!(settings, EmulationSettings::default());
    }
}
