//! Unified error types for the emulation workspace.
//!
//! Every variant is terminal: generation aborts at the point of detection
//! and the CLI is the only layer that formats and reports the failure.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::HardwareKind;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum EmulationError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A builder requires hardware that the fleet does not declare.
    #[error("hardware \"{hardware}\" does not exist in the configuration")]
    HardwareDoesNotExist {
        /// Hardware kind the builder needed.
        hardware: HardwareKind,
    },

    /// A builder found a robot of the wrong kind.
    #[error("incorrect hardware: expected \"{expected}\", found \"{found}\"")]
    IncorrectHardware {
        /// Hardware kind that was declared.
        found: HardwareKind,
        /// Hardware kind the builder needed.
        expected: HardwareKind,
    },

    /// Two merged sources produced different values for one build argument.
    #[error("conflicting values for build argument {key}: \"{existing}\" and \"{incoming}\"")]
    BuildArgConflict {
        /// Build argument name.
        key: String,
        /// Value already present.
        existing: String,
        /// Value that would have replaced it.
        incoming: String,
    },

    /// A mount was requested by name from an empty catalog.
    #[error("you have no mounts defined")]
    NoMountsDefined,

    /// A mount was requested by a name that is not in the catalog.
    #[error("mount named \"{name}\" not found")]
    MountNotFound {
        /// Requested mount name.
        name: String,
    },

    /// A user-declared mount reused an internal mount name.
    #[error("mount name \"{name}\" is reserved for internal use")]
    ReservedMountName {
        /// Offending mount name.
        name: String,
    },

    /// An entity declared the same mount name twice.
    #[error("\"{entity}\" declares mount \"{name}\" more than once")]
    DuplicateMountName {
        /// Identifier of the declaring entity.
        entity: String,
        /// Repeated mount name.
        name: String,
    },

    /// Two different host paths are mounted at one container path.
    #[error(
        "\"{entity}\" mounts both \"{}\" and \"{}\" at {mount_path}",
        first.display(),
        second.display()
    )]
    MountPathConflict {
        /// Identifier of the mounting entity.
        entity: String,
        /// Shared container path.
        mount_path: String,
        /// Host path mounted first.
        first: PathBuf,
        /// Host path that would shadow it.
        second: PathBuf,
    },

    /// A user-declared mount points at a missing file or directory.
    #[error("source path \"{}\" of mount \"{name}\" does not exist", path.display())]
    MountSourceMissing {
        /// Mount name.
        name: String,
        /// Missing host path.
        path: PathBuf,
    },

    /// No image exists for the requested hardware/emulation-level pair.
    #[error("emulation level \"{level}\" not supported for \"{hardware}\"")]
    EmulationLevelNotSupported {
        /// Requested emulation level.
        level: String,
        /// Hardware kind.
        hardware: HardwareKind,
    },

    /// A local source location is not an existing directory.
    #[error("\"{}\" is not a valid directory path", path.display())]
    LocalSourceDoesNotExist {
        /// Declared source location.
        path: PathBuf,
    },

    /// Two or more services resolve to the same container name.
    #[error(
        "the following container names are duplicated in the configuration file: {}",
        names.join(", ")
    )]
    DuplicateHardwareName {
        /// Every colliding name, once each.
        names: Vec<String>,
    },

    /// A service dependency is dangling or cyclic.
    #[error("invalid service dependencies: {message}")]
    Dependency {
        /// Description of the broken dependency.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// YAML serialization or deserialization failed.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, EmulationError>;
