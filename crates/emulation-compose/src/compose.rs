//! Compose document rendering.

use std::collections::BTreeMap;

use emulation_common::constants::DEFAULT_DOCKER_COMPOSE_VERSION;
use emulation_common::error::Result;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::assembler::FleetAssembly;

/// Top-level entry rendered as `name: {}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmptyEntry {}

/// A compose document; services and networks keep assembly order.
#[derive(Debug, Clone, Serialize)]
pub struct ComposeDocument {
    /// Compose file format version.
    pub version: &'static str,
    /// Services keyed by container name.
    pub services: Mapping,
    /// Networks.
    pub networks: Mapping,
    /// Named volumes.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, EmptyEntry>,
}

impl ComposeDocument {
    /// Builds the document of an assembled fleet.
    ///
    /// # Errors
    ///
    /// Returns a YAML error if a service cannot be converted.
    pub fn from_assembly(assembly: &FleetAssembly) -> Result<Self> {
        let mut services = Mapping::new();
        for service in assembly.services() {
            let _ = services.insert(
                Value::String(service.container_name.clone()),
                serde_yaml::to_value(service)?,
            );
        }
        let mut networks = Mapping::new();
        for network in assembly.networks() {
            let _ = networks.insert(
                Value::String(network.clone()),
                Value::Mapping(Mapping::new()),
            );
        }
        let volumes = assembly
            .volumes()
            .iter()
            .map(|name| (name.clone(), EmptyEntry::default()))
            .collect();
        Ok(Self {
            version: DEFAULT_DOCKER_COMPOSE_VERSION,
            services,
            networks,
            volumes,
        })
    }
}

/// Renders `assembly` as a compose YAML document.
///
/// # Errors
///
/// Returns a YAML error if serialization fails.
pub fn to_compose_yaml(assembly: &FleetAssembly) -> Result<String> {
    Ok(serde_yaml::to_string(&ComposeDocument::from_assembly(assembly)?)?)
}

/// Renders `assembly` as a compose JSON value.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_compose_value(assembly: &FleetAssembly) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(ComposeDocument::from_assembly(assembly)?)?)
}
