//! `em plan` — Show the services a fleet definition assembles to.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use emulation_common::config::EmulationSettings;

use crate::output::format_plan;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the fleet definition (.json, .yaml or .yml).
    pub config: PathBuf,
}

/// Executes the `plan` command.
///
/// Assembles the fleet without rendering it and prints every service with
/// its image and dependencies, followed by the networks and volumes.
///
/// # Errors
///
/// Returns an error if loading or assembly fails.
pub fn execute(args: &PlanArgs, settings: &EmulationSettings) -> anyhow::Result<()> {
    let fleet = emulation_compose::load_system_configuration(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let assembly = emulation_compose::assemble(&fleet, settings, false)?;

    #[allow(clippy::print_stdout)]
    {
        print!("{}", format_plan(&args.config.display().to_string(), &assembly));
    }

    Ok(())
}
