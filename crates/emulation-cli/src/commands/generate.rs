//! `em generate` — Write the compose file of a fleet definition.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use emulation_common::config::EmulationSettings;

/// Arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to the fleet definition (.json, .yaml or .yml).
    pub config: PathBuf,

    /// Build images with the development Dockerfile.
    #[arg(long)]
    pub dev: bool,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Loads, assembles and renders the fleet at `config`.
///
/// # Errors
///
/// Returns an error if loading, assembly or rendering fails.
pub fn render(config: &Path, settings: &EmulationSettings, dev: bool) -> anyhow::Result<String> {
    let fleet = emulation_compose::load_system_configuration(config)
        .with_context(|| format!("failed to load {}", config.display()))?;
    let assembly = emulation_compose::assemble(&fleet, settings, dev)?;
    Ok(emulation_compose::to_compose_yaml(&assembly)?)
}

/// Executes the `generate` command.
///
/// # Errors
///
/// Returns an error if generation fails or the output cannot be written.
pub fn execute(args: &GenerateArgs, settings: &EmulationSettings) -> anyhow::Result<()> {
    let yaml = render(&args.config, settings, args.dev)?;

    if let Some(ref out_path) = args.output {
        std::fs::write(out_path, &yaml)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        tracing::info!(path = %out_path.display(), "compose file written");
    } else {
        #[allow(clippy::print_stdout)]
        {
            print!("{yaml}");
        }
    }

    Ok(())
}
