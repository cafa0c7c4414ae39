//! Assembled service values, serialized as compose service entries.

use std::collections::BTreeMap;
use std::path::PathBuf;

use emulation_common::constants::{
    HEALTHCHECK_INTERVAL_SECS, HEALTHCHECK_RETRIES, HEALTHCHECK_TIMEOUT_SECS,
};
use serde::Serialize;

use crate::source::BuildArgs;

/// How the image of a service is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSpec {
    /// Directory holding the Dockerfiles.
    pub context: PathBuf,
    /// Multi-stage build target, equal to the image name.
    pub target: String,
    /// Dockerfile name relative to `context`.
    pub dockerfile: String,
    /// Build arguments.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BuildArgs,
}

/// Shell probe run periodically inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "HealthCheckEntry")]
pub struct HealthCheck {
    /// Shell command; success means healthy.
    pub probe: String,
    /// Seconds between probes.
    pub interval_secs: u32,
    /// Failures tolerated before the container is unhealthy.
    pub retries: u32,
    /// Seconds a single probe may run.
    pub timeout_secs: u32,
}

impl HealthCheck {
    /// Health check with the default interval, retries and timeout.
    #[must_use]
    pub fn shell(probe: impl Into<String>) -> Self {
        Self {
            probe: probe.into(),
            interval_secs: HEALTHCHECK_INTERVAL_SECS,
            retries: HEALTHCHECK_RETRIES,
            timeout_secs: HEALTHCHECK_TIMEOUT_SECS,
        }
    }

    /// Probe verifying every directory in `dirs` exists.
    #[must_use]
    pub fn directories_exist<'a>(dirs: impl IntoIterator<Item = &'a str>) -> Self {
        let probe = dirs
            .into_iter()
            .map(|dir| format!("(cd {dir})"))
            .collect::<Vec<_>>()
            .join(" && ");
        Self::shell(probe)
    }
}

/// Compose rendering of a [`HealthCheck`].
#[derive(Debug, Serialize)]
struct HealthCheckEntry {
    test: [String; 2],
    interval: String,
    retries: u32,
    timeout: String,
}

impl From<HealthCheck> for HealthCheckEntry {
    fn from(check: HealthCheck) -> Self {
        Self {
            test: ["CMD-SHELL".to_string(), check.probe],
            interval: format!("{}s", check.interval_secs),
            retries: check.retries,
            timeout: format!("{}s", check.timeout_secs),
        }
    }
}

/// One fully resolved service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltService {
    /// Globally unique container name.
    pub container_name: String,
    /// Image name.
    pub image: String,
    /// Build spec, absent for services running a local source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSpec>,
    /// Allocate a TTY.
    pub tty: bool,
    /// Bind mounts and named volumes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    /// Networks joined.
    pub networks: Vec<String>,
    /// Published ports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<String>>,
    /// Command override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Services started before this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<String>>,
    /// Environment variables.
    #[serde(rename = "environment", skip_serializing_if = "BTreeMap::is_empty")]
    pub env_vars: BTreeMap<String, String>,
    /// Health check.
    #[serde(rename = "healthcheck", skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
}

impl BuiltService {
    /// Names of the named volumes this service references.
    pub fn named_volumes(&self) -> impl Iterator<Item = &str> {
        self.volumes
            .iter()
            .filter(|v| crate::mount::is_named_volume(v))
            .filter_map(|v| v.split_once(':').map(|(name, _)| name))
    }
}
