//! Validated, immutable fleet model.
//!
//! Values of these types are only produced by the construction step in
//! [`crate::input`], so every local source path has already been checked
//! and every nested source is consistent with its robot.

use std::path::{Path, PathBuf};

use emulation_common::constants::{
    CAN_NETWORK_NAME, CAN_SERVER_MOUNT_NAME, DEFAULT_NETWORK_NAME, ROBOT_SERVER_MOUNT_NAME,
    SOURCE_CODE_MOUNT_NAME,
};
use emulation_common::types::{EmulationLevel, HardwareKind, Repository, SourceType};
use serde::{Deserialize, Serialize};

/// A remote source reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRef {
    /// Head of the repository's default branch.
    Latest,
    /// A commit SHA or branch name.
    Commit(String),
}

/// Where a source tree is taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Existing directory on the host.
    Local(PathBuf),
    /// Archive downloaded while building the image.
    Remote(RemoteRef),
}

/// A source tree of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Repository the tree belongs to.
    pub repository: Repository,
    /// Where the tree is taken from.
    pub location: SourceLocation,
}

impl Source {
    /// Head of `repository`, downloaded at build time.
    #[must_use]
    pub const fn remote_latest(repository: Repository) -> Self {
        Self {
            repository,
            location: SourceLocation::Remote(RemoteRef::Latest),
        }
    }

    /// Returns whether the tree is local or remote.
    #[must_use]
    pub const fn source_type(&self) -> SourceType {
        match self.location {
            SourceLocation::Local(_) => SourceType::Local,
            SourceLocation::Remote(_) => SourceType::Remote,
        }
    }

    /// Returns the host directory of a local source.
    #[must_use]
    pub fn local_path(&self) -> Option<&Path> {
        match &self.location {
            SourceLocation::Local(path) => Some(path),
            SourceLocation::Remote(_) => None,
        }
    }

    /// Returns `true` for local sources.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self.location, SourceLocation::Local(_))
    }
}

/// Kind of host path a mount attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountType {
    /// A single file.
    File,
    /// A directory.
    Directory,
}

/// A bind mount from the host into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    /// Logical name, unique within an entity.
    pub name: String,
    /// File or directory mount.
    pub mount_type: MountType,
    /// Host-side path.
    pub source_path: PathBuf,
    /// Container-side path.
    pub mount_path: String,
}

impl Mount {
    /// Renders the mount as a compose `host:container` string.
    ///
    /// Relative host paths are prefixed with `./` so compose never reads
    /// them as named volumes.
    #[must_use]
    pub fn bind_mount_string(&self) -> String {
        let host = self.source_path.to_string_lossy();
        if self.source_path.is_relative() && !host.starts_with('.') {
            format!("./{host}:{}", self.mount_path)
        } else {
            format!("{host}:{}", self.mount_path)
        }
    }
}

/// Ports and environment variable a module's emulator proxy listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyInfo {
    /// Variable carrying the port pair.
    pub env_var_name: &'static str,
    /// Port the emulator connects to.
    pub emulator_port: u16,
    /// Port the driver connects to.
    pub driver_port: u16,
}

impl ProxyInfo {
    /// Every module kind's proxy information.
    pub const ALL: [Self; 4] = [
        Self::TEMPERATURE,
        Self::MAGNETIC,
        Self::THERMOCYCLER,
        Self::HEATER_SHAKER,
    ];

    const TEMPERATURE: Self = Self {
        env_var_name: "OT_EMULATOR_tempdeck_proxy",
        emulator_port: 10001,
        driver_port: 11001,
    };
    const MAGNETIC: Self = Self {
        env_var_name: "OT_EMULATOR_magdeck_proxy",
        emulator_port: 10002,
        driver_port: 11002,
    };
    const THERMOCYCLER: Self = Self {
        env_var_name: "OT_EMULATOR_thermocycler_proxy",
        emulator_port: 10003,
        driver_port: 11003,
    };
    const HEATER_SHAKER: Self = Self {
        env_var_name: "OT_EMULATOR_heatershaker_proxy",
        emulator_port: 10004,
        driver_port: 11004,
    };

    /// Returns the proxy information of a module kind, `None` for robots.
    #[must_use]
    pub const fn for_kind(kind: HardwareKind) -> Option<Self> {
        match kind {
            HardwareKind::TemperatureModule => Some(Self::TEMPERATURE),
            HardwareKind::MagneticModule => Some(Self::MAGNETIC),
            HardwareKind::ThermocyclerModule => Some(Self::THERMOCYCLER),
            HardwareKind::HeaterShakerModule => Some(Self::HEATER_SHAKER),
            HardwareKind::Ot2 | HardwareKind::Ot3 => None,
        }
    }

    /// Returns the JSON value of the environment variable.
    #[must_use]
    pub fn env_value(&self) -> String {
        format!(
            "{{\"emulator_port\": {}, \"driver_port\": {}}}",
            self.emulator_port, self.driver_port
        )
    }
}

/// A declared robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Robot {
    /// Unique identifier.
    pub id: String,
    /// `ot2` or `ot3`.
    pub hardware: HardwareKind,
    /// Robot-server source.
    pub source: Source,
    /// Host port the robot server is published on.
    pub exposed_port: u16,
    /// Container port the robot server binds.
    pub bound_port: u16,
    /// OT-3 CAN server source.
    pub can_server_source: Option<Source>,
    /// OT-3 hardware-controller firmware source.
    pub hardware_controller_source: Option<Source>,
    /// User-declared mounts.
    pub extra_mounts: Vec<Mount>,
}

impl Robot {
    /// Returns `true` for CAN-bus robots.
    #[must_use]
    pub fn is_ot3(&self) -> bool {
        self.hardware == HardwareKind::Ot3
    }

    /// Returns the compose port binding.
    #[must_use]
    pub fn port_binding(&self) -> String {
        format!("{}:{}", self.exposed_port, self.bound_port)
    }
}

/// A declared module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Unique identifier.
    pub id: String,
    /// Module kind.
    pub hardware: HardwareKind,
    /// Firmware or hardware emulation.
    pub emulation_level: EmulationLevel,
    /// Emulator source.
    pub source: Source,
    /// Serial number reported by the emulator.
    pub serial_number: String,
    /// User-declared mounts.
    pub extra_mounts: Vec<Mount>,
}

impl Module {
    /// Repository a module emulator is built from at `level`.
    #[must_use]
    pub const fn repository_for(level: EmulationLevel) -> Repository {
        match level {
            EmulationLevel::Firmware => Repository::Opentrons,
            EmulationLevel::Hardware => Repository::OpentronsModules,
        }
    }
}

/// Borrowed view of one declared entity.
#[derive(Debug, Clone, Copy)]
pub enum HardwareEntity<'a> {
    /// The fleet's robot.
    Robot(&'a Robot),
    /// One of the fleet's modules.
    Module(&'a Module),
}

impl<'a> HardwareEntity<'a> {
    /// Entity identifier.
    #[must_use]
    pub fn id(&self) -> &'a str {
        match *self {
            Self::Robot(r) => r.id.as_str(),
            Self::Module(m) => m.id.as_str(),
        }
    }

    /// Entity hardware kind.
    #[must_use]
    pub const fn hardware(&self) -> HardwareKind {
        match *self {
            Self::Robot(r) => r.hardware,
            Self::Module(m) => m.hardware,
        }
    }

    /// The entity's own source.
    #[must_use]
    pub fn source(&self) -> &'a Source {
        match *self {
            Self::Robot(r) => &r.source,
            Self::Module(m) => &m.source,
        }
    }

    /// User-declared mounts.
    #[must_use]
    pub fn extra_mounts(&self) -> &'a [Mount] {
        match *self {
            Self::Robot(r) => &r.extra_mounts,
            Self::Module(m) => &m.extra_mounts,
        }
    }

    /// Every source the entity builds from, keyed by its reserved mount name.
    ///
    /// The entity's own source comes first, followed by nested sources.
    #[must_use]
    pub fn sources(&self) -> Vec<(&'static str, &'a Source)> {
        match *self {
            Self::Robot(r) => {
                let mut sources = vec![(ROBOT_SERVER_MOUNT_NAME, &r.source)];
                if let Some(can) = &r.can_server_source {
                    sources.push((CAN_SERVER_MOUNT_NAME, can));
                }
                if let Some(hc) = &r.hardware_controller_source {
                    sources.push((SOURCE_CODE_MOUNT_NAME, hc));
                }
                sources
            }
            Self::Module(m) => vec![(SOURCE_CODE_MOUNT_NAME, &m.source)],
        }
    }

    /// Sources bind-mounted into the entity's own container.
    ///
    /// Like [`Self::sources`] without the CAN-server source, which only the
    /// CAN server mounts.
    #[must_use]
    pub fn mounted_sources(&self) -> Vec<(&'static str, &'a Source)> {
        self.sources()
            .into_iter()
            .filter(|(name, _)| *name != CAN_SERVER_MOUNT_NAME)
            .collect()
    }
}

/// The validated fleet definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemConfiguration {
    /// Prefix applied to every container name.
    pub system_unique_id: Option<String>,
    /// Optional robot.
    pub robot: Option<Robot>,
    /// Modules in declaration order.
    pub modules: Vec<Module>,
}

impl SystemConfiguration {
    /// Returns every declared entity, robot first.
    pub fn entities(&self) -> impl Iterator<Item = HardwareEntity<'_>> {
        self.robot
            .iter()
            .map(HardwareEntity::Robot)
            .chain(self.modules.iter().map(HardwareEntity::Module))
    }

    /// Whether the robot is an OT-2.
    #[must_use]
    pub fn has_ot2(&self) -> bool {
        self.robot
            .as_ref()
            .is_some_and(|r| r.hardware == HardwareKind::Ot2)
    }

    /// Whether the robot is an OT-3.
    #[must_use]
    pub fn has_ot3(&self) -> bool {
        self.robot.as_ref().is_some_and(Robot::is_ot3)
    }

    /// Whether any module is declared.
    #[must_use]
    pub fn has_modules(&self) -> bool {
        !self.modules.is_empty()
    }

    /// Networks every service of this fleet joins.
    #[must_use]
    pub fn required_networks(&self) -> Vec<String> {
        let mut networks = vec![DEFAULT_NETWORK_NAME.to_string()];
        if self.has_ot3() {
            networks.push(CAN_NETWORK_NAME.to_string());
        }
        networks
    }

    /// Prefixes `name` with the system unique id, when one is set.
    #[must_use]
    pub fn container_name(&self, name: &str) -> String {
        match &self.system_unique_id {
            Some(prefix) => format!("{prefix}-{name}"),
            None => name.to_string(),
        }
    }

    /// First local source of `repo`, in declaration order.
    #[must_use]
    pub fn first_local_source(&self, repo: Repository) -> Option<&Source> {
        self.entities()
            .flat_map(|entity| entity.sources())
            .map(|(_, source)| source)
            .find(|source| source.repository == repo && source.is_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(repo: Repository, path: &str) -> Source {
        Source {
            repository: repo,
            location: SourceLocation::Local(PathBuf::from(path)),
        }
    }

    fn ot3(can: Option<Source>) -> Robot {
        Robot {
            id: "ot3".into(),
            hardware: HardwareKind::Ot3,
            source: Source::remote_latest(Repository::Opentrons),
            exposed_port: 31950,
            bound_port: 31950,
            can_server_source: can,
            hardware_controller_source: Some(local(Repository::Ot3Firmware, "/src/ot3-firmware")),
            extra_mounts: Vec::new(),
        }
    }

    #[test]
    fn relative_mount_source_is_dot_prefixed() {
        let mount = Mount {
            name: "LOGS".into(),
            mount_type: MountType::Directory,
            source_path: PathBuf::from("logs"),
            mount_path: "/var/log".into(),
        };
        assert_eq!(mount.bind_mount_string(), "./logs:/var/log");
    }

    #[test]
    fn absolute_mount_source_is_verbatim() {
        let mount = Mount {
            name: "CONF".into(),
            mount_type: MountType::File,
            source_path: PathBuf::from("/etc/robot.json"),
            mount_path: "/data/robot.json".into(),
        };
        assert_eq!(mount.bind_mount_string(), "/etc/robot.json:/data/robot.json");
    }

    #[test]
    fn robot_sources_list_nested_sources_after_own() {
        let robot = ot3(Some(Source::remote_latest(Repository::Opentrons)));
        let names: Vec<&str> = HardwareEntity::Robot(&robot)
            .sources()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            names,
            vec![ROBOT_SERVER_MOUNT_NAME, CAN_SERVER_MOUNT_NAME, SOURCE_CODE_MOUNT_NAME]
        );
    }

    #[test]
    fn can_server_source_is_not_mounted_by_robot() {
        let robot = ot3(Some(Source::remote_latest(Repository::Opentrons)));
        let names: Vec<&str> = HardwareEntity::Robot(&robot)
            .mounted_sources()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec![ROBOT_SERVER_MOUNT_NAME, SOURCE_CODE_MOUNT_NAME]);
    }

    #[test]
    fn ot3_fleet_requires_can_network() {
        let config = SystemConfiguration {
            robot: Some(ot3(None)),
            ..SystemConfiguration::default()
        };
        assert!(config.has_ot3());
        assert_eq!(
            config.required_networks(),
            vec![DEFAULT_NETWORK_NAME, CAN_NETWORK_NAME]
        );
    }

    #[test]
    fn container_name_uses_system_unique_id() {
        let mut config = SystemConfiguration::default();
        assert_eq!(config.container_name("smoothie"), "smoothie");
        config.system_unique_id = Some("lab-a".into());
        assert_eq!(config.container_name("smoothie"), "lab-a-smoothie");
    }

    #[test]
    fn first_local_source_searches_nested_sources() {
        let config = SystemConfiguration {
            robot: Some(ot3(None)),
            ..SystemConfiguration::default()
        };
        let found = config
            .first_local_source(Repository::Ot3Firmware)
            .expect("hardware controller source");
        assert_eq!(found.local_path(), Some(Path::new("/src/ot3-firmware")));
        assert!(config.first_local_source(Repository::Opentrons).is_none());
    }

    #[test]
    fn proxy_env_value_is_json() {
        let info = ProxyInfo::for_kind(HardwareKind::HeaterShakerModule).expect("module");
        let value: serde_json::Value = serde_json::from_str(&info.env_value()).expect("json");
        assert_eq!(value["emulator_port"], 10004);
        assert_eq!(value["driver_port"], 11004);
        assert!(ProxyInfo::for_kind(HardwareKind::Ot2).is_none());
    }
}
