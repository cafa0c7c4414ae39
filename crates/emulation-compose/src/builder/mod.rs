//! Service builders.
//!
//! One builder per service kind. Constructors do every fallible step
//! (image lookup, mount validation, build-argument merging) so that the
//! per-field operations of [`ServiceBuilder`] are infallible and can be
//! called independently.

pub mod can_server;
pub mod emulator_proxy;
pub mod module;
pub mod robot;
pub mod smoothie;
pub mod source_builder;

use std::collections::BTreeMap;

use emulation_common::config::EmulationSettings;
use emulation_common::constants::{DEV_DOCKERFILE_NAME, DOCKERFILE_NAME};

use crate::input::model::SystemConfiguration;
use crate::service::{BuildSpec, BuiltService, HealthCheck};
use crate::source::BuildArgs;

pub use self::can_server::CanServerBuilder;
pub use self::emulator_proxy::EmulatorProxyBuilder;
pub use self::module::ModuleBuilder;
pub use self::robot::RobotBuilder;
pub use self::smoothie::SmoothieBuilder;
pub use self::source_builder::LocalSourceBuilder;

/// Container names of the companion services present in a fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Companions {
    /// Emulator proxy, present when modules are declared.
    pub emulator_proxy: Option<String>,
    /// Smoothie emulator, present with an OT-2.
    pub smoothie: Option<String>,
    /// CAN server, present with an OT-3 declaring its source.
    pub can_server: Option<String>,
}

/// Everything a builder reads besides its own entity.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    /// Validated fleet.
    pub config: &'a SystemConfiguration,
    /// Global settings.
    pub settings: &'a EmulationSettings,
    /// Build with the development Dockerfile.
    pub dev: bool,
    /// Fleet-wide networks.
    pub networks: &'a [String],
    /// Companion service names.
    pub companions: &'a Companions,
}

impl BuildContext<'_> {
    /// Applies the fleet's system unique id to `name`.
    #[must_use]
    pub fn container_name(&self, name: &str) -> String {
        self.config.container_name(name)
    }

    /// Dockerfile selected by the dev flag.
    #[must_use]
    pub const fn dockerfile(&self) -> &'static str {
        if self.dev {
            DEV_DOCKERFILE_NAME
        } else {
            DOCKERFILE_NAME
        }
    }

    /// Build spec targeting `image` in the settings' docker directory.
    #[must_use]
    pub fn build_spec(&self, image: &str, args: BuildArgs) -> BuildSpec {
        BuildSpec {
            context: self.settings.docker_directory.clone(),
            target: image.to_string(),
            dockerfile: self.dockerfile().to_string(),
            args,
        }
    }
}

/// Common operation set of every service builder.
pub trait ServiceBuilder {
    /// Globally unique container name.
    fn container_name(&self) -> String;

    /// Image name.
    fn image(&self) -> &'static str;

    /// Whether the container gets a TTY.
    fn is_tty(&self) -> bool {
        true
    }

    /// Networks the service joins.
    fn networks(&self) -> Vec<String>;

    /// Build spec, `None` when the service runs a local source.
    fn build(&self) -> Option<BuildSpec>;

    /// Bind mounts and named volumes.
    fn volumes(&self) -> Vec<String>;

    /// Command override.
    fn command(&self) -> Option<String> {
        None
    }

    /// Published ports.
    fn ports(&self) -> Option<Vec<String>> {
        None
    }

    /// Services this one depends on.
    fn depends_on(&self) -> Option<Vec<String>> {
        None
    }

    /// Environment variables.
    fn env_vars(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Health check.
    fn health_check(&self) -> Option<HealthCheck> {
        None
    }

    /// Collects every field into a [`BuiltService`].
    fn build_service(&self) -> BuiltService {
        let service = BuiltService {
            container_name: self.container_name(),
            image: self.image().to_string(),
            build: self.build(),
            tty: self.is_tty(),
            volumes: self.volumes(),
            networks: self.networks(),
            ports: self.ports(),
            command: self.command(),
            depends_on: self.depends_on(),
            env_vars: self.env_vars(),
            health_check: self.health_check(),
        };
        tracing::info!(
            service = %service.container_name,
            image = %service.image,
            "built service"
        );
        service
    }
}

/// Returns `None` for an empty list.
fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    if items.is_empty() { None } else { Some(items) }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;

    use emulation_common::config::EmulationSettings;
    use emulation_common::types::{EmulationLevel, HardwareKind, Repository};

    use super::{BuildContext, Companions};
    use crate::input::model::{Module, Robot, Source, SourceLocation, SystemConfiguration};

    pub(crate) fn settings() -> EmulationSettings {
        EmulationSettings {
            docker_directory: PathBuf::from("/opt/emulation/docker"),
            ..EmulationSettings::default()
        }
    }

    pub(crate) fn local(repo: Repository, path: &str) -> Source {
        Source {
            repository: repo,
            location: SourceLocation::Local(PathBuf::from(path)),
        }
    }

    pub(crate) fn robot(id: &str, hardware: HardwareKind, source: Source) -> Robot {
        Robot {
            id: id.into(),
            hardware,
            source,
            exposed_port: 31950,
            bound_port: 31950,
            can_server_source: None,
            hardware_controller_source: None,
            extra_mounts: Vec::new(),
        }
    }

    pub(crate) fn module(id: &str, hardware: HardwareKind, level: EmulationLevel) -> Module {
        Module {
            id: id.into(),
            hardware,
            emulation_level: level,
            source: Source::remote_latest(Module::repository_for(level)),
            serial_number: format!("{id}-sn"),
            extra_mounts: Vec::new(),
        }
    }

    pub(crate) fn context<'a>(
        config: &'a SystemConfiguration,
        settings: &'a EmulationSettings,
        networks: &'a [String],
        companions: &'a Companions,
    ) -> BuildContext<'a> {
        BuildContext {
            config,
            settings,
            dev: false,
            networks,
            companions,
        }
    }
}
