//! Fleet assembly: decides which companion services a fleet needs, runs
//! every builder in a fixed order and checks the result as a whole.

use std::collections::{BTreeMap, BTreeSet};

use emulation_common::config::EmulationSettings;
use emulation_common::error::{EmulationError, Result};
use emulation_common::types::Repository;

use crate::builder::can_server::CAN_SERVER_NAME;
use crate::builder::emulator_proxy::EMULATOR_PROXY_NAME;
use crate::builder::smoothie::SMOOTHIE_NAME;
use crate::builder::{
    BuildContext, CanServerBuilder, Companions, EmulatorProxyBuilder, LocalSourceBuilder,
    ModuleBuilder, RobotBuilder, ServiceBuilder, SmoothieBuilder,
};
use crate::graph::check_dependencies;
use crate::input::model::SystemConfiguration;
use crate::service::BuiltService;

/// Every service of a fleet plus the top-level networks and volumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetAssembly {
    services: Vec<BuiltService>,
    networks: Vec<String>,
    volumes: BTreeSet<String>,
    start_order: Vec<String>,
}

impl FleetAssembly {
    /// Services in assembly order.
    #[must_use]
    pub fn services(&self) -> &[BuiltService] {
        &self.services
    }

    /// Looks up a service by container name.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&BuiltService> {
        self.services.iter().find(|s| s.container_name == name)
    }

    /// Container names in assembly order.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|s| s.container_name.as_str())
    }

    /// Networks joined by the services.
    #[must_use]
    pub fn networks(&self) -> &[String] {
        &self.networks
    }

    /// Named volumes referenced by the services.
    #[must_use]
    pub const fn volumes(&self) -> &BTreeSet<String> {
        &self.volumes
    }

    /// Container names with dependencies before their dependents.
    #[must_use]
    pub fn start_order(&self) -> &[String] {
        &self.start_order
    }
}

/// Decides which companion services `config` needs and names them.
#[must_use]
pub fn companions(config: &SystemConfiguration) -> Companions {
    let declares_can_server = config
        .robot
        .as_ref()
        .is_some_and(|r| r.is_ot3() && r.can_server_source.is_some());
    Companions {
        emulator_proxy: config
            .has_modules()
            .then(|| config.container_name(EMULATOR_PROXY_NAME)),
        smoothie: config
            .has_ot2()
            .then(|| config.container_name(SMOOTHIE_NAME)),
        can_server: declares_can_server.then(|| config.container_name(CAN_SERVER_NAME)),
    }
}

/// Assembles every service of `config`.
///
/// Order: emulator proxy, smoothie, CAN server, robot, modules in
/// declaration order, then one local source builder per repository with a
/// local source.
///
/// # Errors
///
/// Returns the first builder error, `DuplicateHardwareName` if container
/// names collide, or a dependency error for dangling or cyclic
/// dependencies.
pub fn assemble(
    config: &SystemConfiguration,
    settings: &EmulationSettings,
    dev: bool,
) -> Result<FleetAssembly> {
    let networks = config.required_networks();
    let companions = companions(config);
    tracing::info!(
        system_unique_id = config.system_unique_id.as_deref().unwrap_or("-"),
        modules = config.modules.len(),
        dev,
        "assembling fleet"
    );
    tracing::debug!(?companions, ?networks, "resolved companions");

    let ctx = BuildContext {
        config,
        settings,
        dev,
        networks: &networks,
        companions: &companions,
    };

    let mut services = Vec::new();
    if companions.emulator_proxy.is_some() {
        services.push(EmulatorProxyBuilder::new(ctx)?.build_service());
    }
    if companions.smoothie.is_some() {
        services.push(SmoothieBuilder::new(ctx)?.build_service());
    }
    if companions.can_server.is_some() {
        services.push(CanServerBuilder::new(ctx)?.build_service());
    }
    if let Some(robot) = &config.robot {
        services.push(RobotBuilder::new(ctx, robot)?.build_service());
    }
    for module in &config.modules {
        services.push(ModuleBuilder::new(ctx, module)?.build_service());
    }
    for repo in Repository::ALL {
        if config.first_local_source(repo).is_some() {
            services.push(LocalSourceBuilder::new(ctx, repo)?.build_service());
        }
    }

    check_unique_names(&services)?;
    let start_order = check_dependencies(
        services
            .iter()
            .map(|s| (s.container_name.as_str(), s))
            .collect::<Vec<_>>(),
    )?;

    let volumes = services
        .iter()
        .flat_map(BuiltService::named_volumes)
        .map(str::to_string)
        .collect();

    tracing::info!(services = services.len(), "fleet assembled");
    Ok(FleetAssembly {
        services,
        networks,
        volumes,
        start_order,
    })
}

fn check_unique_names(services: &[BuiltService]) -> Result<()> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for service in services {
        *counts.entry(service.container_name.as_str()).or_default() += 1;
    }
    let names: Vec<String> = counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(name, _)| name.to_string())
        .collect();
    if names.is_empty() {
        Ok(())
    } else {
        Err(EmulationError::DuplicateHardwareName { names })
    }
}
