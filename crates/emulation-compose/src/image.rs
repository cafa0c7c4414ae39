//! Image selection per hardware kind, source type and emulation level.

use emulation_common::error::{EmulationError, Result};
use emulation_common::types::{EmulationLevel, HardwareKind, Repository, SourceType};

/// A local/remote image pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageNames {
    /// Image used when the source is mounted from the host.
    pub local: &'static str,
    /// Image used when the source is downloaded at build time.
    pub remote: &'static str,
}

impl ImageNames {
    /// Picks the image matching `source_type`.
    #[must_use]
    pub const fn for_source(&self, source_type: SourceType) -> &'static str {
        match source_type {
            SourceType::Local => self.local,
            SourceType::Remote => self.remote,
        }
    }
}

/// Robot server image pair.
pub const ROBOT_SERVER_IMAGES: ImageNames = ImageNames {
    local: "robot-server-local",
    remote: "robot-server-remote",
};

/// Emulator proxy image pair.
pub const EMULATOR_PROXY_IMAGES: ImageNames = ImageNames {
    local: "emulator-proxy-local",
    remote: "emulator-proxy-remote",
};

/// Smoothie emulator image pair.
pub const SMOOTHIE_IMAGES: ImageNames = ImageNames {
    local: "smoothie-local",
    remote: "smoothie-remote",
};

/// CAN server image pair.
pub const CAN_SERVER_IMAGES: ImageNames = ImageNames {
    local: "can-server-local",
    remote: "can-server-remote",
};

/// Builder helper for a local `opentrons` checkout.
pub const LOCAL_MONOREPO_BUILDER_IMAGE: &str = "local-monorepo-builder";
/// Builder helper for a local `ot3-firmware` checkout.
pub const LOCAL_OT3_FIRMWARE_BUILDER_IMAGE: &str = "local-ot3-firmware-builder";
/// Builder helper for a local `opentrons-modules` checkout.
pub const LOCAL_OPENTRONS_MODULES_BUILDER_IMAGE: &str = "local-opentrons-modules-builder";

/// Returns the builder helper image of a repository.
#[must_use]
pub const fn builder_image(repo: Repository) -> &'static str {
    match repo {
        Repository::Opentrons => LOCAL_MONOREPO_BUILDER_IMAGE,
        Repository::Ot3Firmware => LOCAL_OT3_FIRMWARE_BUILDER_IMAGE,
        Repository::OpentronsModules => LOCAL_OPENTRONS_MODULES_BUILDER_IMAGE,
    }
}

const HEATER_SHAKER_FIRMWARE: ImageNames = ImageNames {
    local: "heater-shaker-firmware-local",
    remote: "heater-shaker-firmware-remote",
};
const HEATER_SHAKER_HARDWARE: ImageNames = ImageNames {
    local: "heater-shaker-hardware-local",
    remote: "heater-shaker-hardware-remote",
};
const THERMOCYCLER_FIRMWARE: ImageNames = ImageNames {
    local: "thermocycler-firmware-local",
    remote: "thermocycler-firmware-remote",
};
const THERMOCYCLER_HARDWARE: ImageNames = ImageNames {
    local: "thermocycler-hardware-local",
    remote: "thermocycler-hardware-remote",
};
const TEMPDECK_FIRMWARE: ImageNames = ImageNames {
    local: "tempdeck-firmware-local",
    remote: "tempdeck-firmware-remote",
};
const MAGDECK_FIRMWARE: ImageNames = ImageNames {
    local: "magdeck-firmware-local",
    remote: "magdeck-firmware-remote",
};

/// Image table of a hardware kind, keyed by emulation level.
///
/// Robots have no emulation level and are keyed by `None`.
const fn image_table(kind: HardwareKind) -> &'static [(Option<EmulationLevel>, ImageNames)] {
    match kind {
        HardwareKind::Ot2 | HardwareKind::Ot3 => &[(None, ROBOT_SERVER_IMAGES)],
        HardwareKind::HeaterShakerModule => &[
            (Some(EmulationLevel::Firmware), HEATER_SHAKER_FIRMWARE),
            (Some(EmulationLevel::Hardware), HEATER_SHAKER_HARDWARE),
        ],
        HardwareKind::ThermocyclerModule => &[
            (Some(EmulationLevel::Firmware), THERMOCYCLER_FIRMWARE),
            (Some(EmulationLevel::Hardware), THERMOCYCLER_HARDWARE),
        ],
        HardwareKind::TemperatureModule => &[(Some(EmulationLevel::Firmware), TEMPDECK_FIRMWARE)],
        HardwareKind::MagneticModule => &[(Some(EmulationLevel::Firmware), MAGDECK_FIRMWARE)],
    }
}

/// Selects the image for a hardware kind.
///
/// # Errors
///
/// Returns `EmulationLevelNotSupported` if the kind has no image for `level`.
pub fn select_image(
    kind: HardwareKind,
    source_type: SourceType,
    level: Option<EmulationLevel>,
) -> Result<&'static str> {
    image_table(kind)
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, images)| images.for_source(source_type))
        .ok_or_else(|| EmulationError::EmulationLevelNotSupported {
            level: level.map_or_else(|| "none".to_string(), |l| l.to_string()),
            hardware: kind,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robot_images() {
        assert_eq!(
            select_image(HardwareKind::Ot2, SourceType::Remote, None).expect("image"),
            "robot-server-remote"
        );
        assert_eq!(
            select_image(HardwareKind::Ot3, SourceType::Local, None).expect("image"),
            "robot-server-local"
        );
    }

    #[test]
    fn module_images_depend_on_level() {
        assert_eq!(
            select_image(
                HardwareKind::HeaterShakerModule,
                SourceType::Remote,
                Some(EmulationLevel::Hardware)
            )
            .expect("image"),
            "heater-shaker-hardware-remote"
        );
        assert_eq!(
            select_image(
                HardwareKind::ThermocyclerModule,
                SourceType::Local,
                Some(EmulationLevel::Firmware)
            )
            .expect("image"),
            "thermocycler-firmware-local"
        );
        assert_eq!(
            select_image(
                HardwareKind::MagneticModule,
                SourceType::Remote,
                Some(EmulationLevel::Firmware)
            )
            .expect("image"),
            "magdeck-firmware-remote"
        );
    }

    #[test]
    fn unsupported_level_names_level_and_kind() {
        let err = select_image(
            HardwareKind::TemperatureModule,
            SourceType::Remote,
            Some(EmulationLevel::Hardware),
        )
        .expect_err("should fail");
        assert!(
            matches!(
                err,
                EmulationError::EmulationLevelNotSupported {
                    hardware: HardwareKind::TemperatureModule,
                    ..
                }
            ),
            "got: {err}"
        );
        let message = err.to_string();
        assert!(message.contains("hardware"));
        assert!(message.contains("temperature-module"));
    }

    #[test]
    fn builder_images_are_fixed() {
        assert_eq!(builder_image(Repository::Opentrons), "local-monorepo-builder");
        assert_eq!(
            builder_image(Repository::OpentronsModules),
            "local-opentrons-modules-builder"
        );
    }
}
