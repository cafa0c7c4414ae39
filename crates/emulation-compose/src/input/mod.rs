//! Fleet configuration loading.
//!
//! Turns a JSON or YAML document into a validated [`SystemConfiguration`]
//! in two phases: serde deserialization into raw structures, then a single
//! pure conversion that checks every field and builds the immutable model.

pub mod model;
pub mod validator;

use std::path::{Path, PathBuf};

use emulation_common::constants::ROBOT_SERVER_DEFAULT_PORT;
use emulation_common::error::{EmulationError, Result};
use emulation_common::types::{EmulationLevel, HardwareKind, Repository, SourceType};
use serde::Deserialize;

use self::model::{Module, MountType, Robot, SystemConfiguration};

/// Serialization format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON document.
    Json,
    /// YAML document.
    Yaml,
}

impl ConfigFormat {
    /// Picks the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for anything but `.json`, `.yaml`, `.yml`.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(EmulationError::Config {
                message: format!(
                    "cannot infer configuration format of {}, expected .json, .yaml or .yml",
                    path.display()
                ),
            }),
        }
    }
}

/// Raw top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawSystemConfiguration {
    /// Container name prefix.
    pub system_unique_id: Option<String>,
    /// Robot declaration.
    pub robot: Option<RawRobot>,
    /// Module declarations.
    #[serde(default)]
    pub modules: Vec<RawModule>,
}

/// Raw robot declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawRobot {
    /// Identifier.
    pub id: String,
    /// Hardware kind.
    pub hardware: HardwareKind,
    /// Robot-server source type.
    pub source_type: SourceType,
    /// Robot-server source location.
    pub source_location: String,
    /// Published port.
    pub exposed_port: u16,
    /// Container port.
    pub bound_port: Option<u16>,
    /// CAN server source type.
    pub can_server_source_type: Option<SourceType>,
    /// CAN server source location.
    pub can_server_source_location: Option<String>,
    /// Hardware-controller source type.
    pub hardware_controller_source_type: Option<SourceType>,
    /// Hardware-controller source location.
    pub hardware_controller_source_location: Option<String>,
    /// Extra mounts.
    #[serde(default)]
    pub extra_mounts: Vec<RawMount>,
}

/// Raw module declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawModule {
    /// Identifier.
    pub id: String,
    /// Hardware kind.
    pub hardware: HardwareKind,
    /// Emulation level.
    pub emulation_level: EmulationLevel,
    /// Source type.
    pub source_type: SourceType,
    /// Source location.
    pub source_location: String,
    /// Serial number, defaults to the id.
    pub serial_number: Option<String>,
    /// Extra mounts.
    #[serde(default)]
    pub extra_mounts: Vec<RawMount>,
}

/// Raw extra mount declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawMount {
    /// Mount name.
    pub name: String,
    /// `file` or `directory`.
    #[serde(rename = "type")]
    pub mount_type: MountType,
    /// Host path.
    pub source_path: PathBuf,
    /// Container path.
    pub mount_path: String,
}

/// Reads and validates a configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load_system_configuration(path: &Path) -> Result<SystemConfiguration> {
    tracing::info!(path = %path.display(), "loading system configuration");
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| EmulationError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_system_configuration(&content, format)
}

/// Parses and validates a configuration document.
///
/// # Errors
///
/// Returns an error if the document is malformed or fails validation.
pub fn parse_system_configuration(
    content: &str,
    format: ConfigFormat,
) -> Result<SystemConfiguration> {
    let raw: RawSystemConfiguration = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
    };
    SystemConfiguration::try_from(raw)
}

impl TryFrom<RawSystemConfiguration> for SystemConfiguration {
    type Error = EmulationError;

    fn try_from(raw: RawSystemConfiguration) -> Result<Self> {
        if let Some(prefix) = &raw.system_unique_id {
            validator::check_identifier("system-unique-id", prefix)?;
        }
        let robot = raw.robot.map(build_robot).transpose()?;
        let modules = raw
            .modules
            .into_iter()
            .map(build_module)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            robot = robot.is_some(),
            modules = modules.len(),
            "system configuration validated"
        );
        Ok(Self {
            system_unique_id: raw.system_unique_id,
            robot,
            modules,
        })
    }
}

fn build_robot(raw: RawRobot) -> Result<Robot> {
    validator::check_identifier("id", &raw.id)?;
    if !raw.hardware.is_robot() {
        return Err(EmulationError::Config {
            message: format!("\"{}\" is a {}, not a robot", raw.id, raw.hardware),
        });
    }

    let source = validator::resolve_source(
        Repository::Opentrons,
        raw.source_type,
        &raw.source_location,
    )?;
    let can_server_source = validator::resolve_nested_source(
        &raw.id,
        "can-server",
        Repository::Opentrons,
        raw.can_server_source_type,
        raw.can_server_source_location.as_deref(),
    )?;
    let hardware_controller_source = validator::resolve_nested_source(
        &raw.id,
        "hardware-controller",
        Repository::Ot3Firmware,
        raw.hardware_controller_source_type,
        raw.hardware_controller_source_location.as_deref(),
    )?;

    let declares_nested = can_server_source.is_some() || hardware_controller_source.is_some();
    if declares_nested && raw.hardware != HardwareKind::Ot3 {
        return Err(EmulationError::IncorrectHardware {
            found: raw.hardware,
            expected: HardwareKind::Ot3,
        });
    }

    let extra_mounts = raw
        .extra_mounts
        .into_iter()
        .map(validator::resolve_mount)
        .collect::<Result<Vec<_>>>()?;

    Ok(Robot {
        id: raw.id,
        hardware: raw.hardware,
        source,
        exposed_port: raw.exposed_port,
        bound_port: raw.bound_port.unwrap_or(ROBOT_SERVER_DEFAULT_PORT),
        can_server_source,
        hardware_controller_source,
        extra_mounts,
    })
}

fn build_module(raw: RawModule) -> Result<Module> {
    validator::check_identifier("id", &raw.id)?;
    if !raw.hardware.is_module() {
        return Err(EmulationError::Config {
            message: format!("\"{}\" is a {}, not a module", raw.id, raw.hardware),
        });
    }

    let source = validator::resolve_source(
        Module::repository_for(raw.emulation_level),
        raw.source_type,
        &raw.source_location,
    )?;
    let extra_mounts = raw
        .extra_mounts
        .into_iter()
        .map(validator::resolve_mount)
        .collect::<Result<Vec<_>>>()?;

    Ok(Module {
        serial_number: raw.serial_number.unwrap_or_else(|| raw.id.clone()),
        id: raw.id,
        hardware: raw.hardware,
        emulation_level: raw.emulation_level,
        source,
        extra_mounts,
    })
}
