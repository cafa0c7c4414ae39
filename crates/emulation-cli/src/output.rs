//! Formatted output helpers for CLI commands.

use std::fmt::Write;

use emulation_compose::FleetAssembly;

const RULE_WIDTH: usize = 35;

/// Renders a human-readable plan of an assembled fleet.
#[must_use]
pub fn format_plan(source: &str, assembly: &FleetAssembly) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Emulation Plan for: {source}");
    let _ = writeln!(out, "{}", "\u{2550}".repeat(RULE_WIDTH));
    let _ = writeln!(out);

    for service in assembly.services() {
        let _ = writeln!(out, "  + {}", service.container_name);
        let _ = writeln!(out, "      image: {}", service.image);
        let _ = writeln!(
            out,
            "      source: {}",
            if service.build.is_some() { "remote" } else { "local" }
        );
        if let Some(deps) = &service.depends_on {
            let _ = writeln!(out, "      depends on: {}", deps.join(", "));
        }
        if let Some(ports) = &service.ports {
            let _ = writeln!(out, "      ports: {}", ports.join(", "));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  {} service(s) will be generated.", assembly.services().len());
    let _ = writeln!(out, "  Start order: {}", assembly.start_order().join(" -> "));
    let _ = writeln!(out, "  Networks: {}", assembly.networks().join(", "));
    if !assembly.volumes().is_empty() {
        let volumes: Vec<&str> = assembly.volumes().iter().map(String::as_str).collect();
        let _ = writeln!(out, "  Volumes: {}", volumes.join(", "));
    }
    out
}
