//! System-wide constants and default paths.

/// Source location keyword selecting the head of a repository.
pub const LATEST_KEYWORD: &str = "latest";

/// Placeholder substituted with a commit or branch in commit URL templates.
pub const COMMIT_SHA_PLACEHOLDER: &str = "{{commit-sha}}";

/// Port the robot server binds inside its container.
pub const ROBOT_SERVER_DEFAULT_PORT: u16 = 31950;

/// Port the smoothie emulator listens on.
pub const SMOOTHIE_PORT: u16 = 11000;

/// Network every service joins.
pub const DEFAULT_NETWORK_NAME: &str = "local-network";

/// Network added when an OT-3 is part of the fleet.
pub const CAN_NETWORK_NAME: &str = "can-network";

/// Compose file format version written to generated documents.
pub const DEFAULT_DOCKER_COMPOSE_VERSION: &str = "3.8";

/// Dockerfile used for regular builds.
pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// Dockerfile used when generating in dev mode.
pub const DEV_DOCKERFILE_NAME: &str = "dev_Dockerfile";

/// Default directory holding the Dockerfiles and entrypoint script.
pub const DEFAULT_DOCKER_DIRECTORY: &str = "docker";

/// File name of the shared entrypoint script.
pub const DEFAULT_ENTRYPOINT_NAME: &str = "entrypoint.sh";

/// Container path the entrypoint script is mounted at.
pub const ENTRYPOINT_CONTAINER_PATH: &str = "/entrypoint.sh";

/// Mount name of a module's source or the OT-3 hardware-controller source.
pub const SOURCE_CODE_MOUNT_NAME: &str = "SOURCE_CODE";
/// Mount name of a robot's robot-server source.
pub const ROBOT_SERVER_MOUNT_NAME: &str = "ROBOT_SERVER_SOURCE_CODE";
/// Mount name of the OT-3 CAN server source.
pub const CAN_SERVER_MOUNT_NAME: &str = "CAN_SERVER_SOURCE_CODE";
/// Mount name of the entrypoint script.
pub const ENTRYPOINT_MOUNT_NAME: &str = "ENTRYPOINT";

/// Mount names users may not declare themselves.
pub const RESTRICTED_MOUNT_NAMES: [&str; 4] = [
    SOURCE_CODE_MOUNT_NAME,
    ROBOT_SERVER_MOUNT_NAME,
    ENTRYPOINT_MOUNT_NAME,
    CAN_SERVER_MOUNT_NAME,
];

/// Health check interval in seconds.
pub const HEALTHCHECK_INTERVAL_SECS: u32 = 10;
/// Health check retries before a service is marked unhealthy.
pub const HEALTHCHECK_RETRIES: u32 = 6;
/// Health check timeout in seconds.
pub const HEALTHCHECK_TIMEOUT_SECS: u32 = 10;

/// Environment variable pointing the CLI at a settings file.
pub const SETTINGS_FILE_ENV_VAR: &str = "EMULATION_SETTINGS";

/// Application name used in CLI output.
pub const APP_NAME: &str = "opentrons-emulation";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "em";
