//! Domain primitive types used across the emulation workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the source code for an emulator comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// A checkout on the host, bind-mounted into the container.
    Local,
    /// An archive downloaded at image build time.
    Remote,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Fidelity of a module emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmulationLevel {
    /// Python firmware emulator from the monorepo.
    Firmware,
    /// Simulated hardware running the real module firmware.
    Hardware,
}

impl fmt::Display for EmulationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Firmware => write!(f, "firmware"),
            Self::Hardware => write!(f, "hardware"),
        }
    }
}

/// Source repositories that emulator images are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Repository {
    /// The `opentrons` monorepo (robot server, firmware emulators, proxy).
    Opentrons,
    /// The `ot3-firmware` repository.
    Ot3Firmware,
    /// The `opentrons-modules` repository.
    OpentronsModules,
}

impl Repository {
    /// Every repository, in a fixed order.
    pub const ALL: [Self; 3] = [Self::Opentrons, Self::Ot3Firmware, Self::OpentronsModules];

    /// Returns the repository name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Opentrons => "opentrons",
            Self::Ot3Firmware => "ot3-firmware",
            Self::OpentronsModules => "opentrons-modules",
        }
    }

    /// Returns the container path the repository's checkout is expected at.
    #[must_use]
    pub fn container_path(self) -> String {
        format!("/{}", self.name())
    }

    /// Returns the build argument that carries the download location.
    #[must_use]
    pub const fn build_arg_name(self) -> &'static str {
        match self {
            Self::Opentrons => "OPENTRONS_SOURCE_DOWNLOAD_LOCATION",
            Self::Ot3Firmware => "FIRMWARE_SOURCE_DOWNLOAD_LOCATION",
            Self::OpentronsModules => "MODULE_SOURCE_DOWNLOAD_LOCATION",
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The closed set of hardware that can be emulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HardwareKind {
    /// Legacy robot driven through a smoothie board.
    Ot2,
    /// CAN-bus robot.
    Ot3,
    /// Heater-Shaker module.
    HeaterShakerModule,
    /// Thermocycler module.
    ThermocyclerModule,
    /// Temperature module.
    TemperatureModule,
    /// Magnetic module.
    MagneticModule,
}

impl HardwareKind {
    /// Returns the kebab-case name used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ot2 => "ot2",
            Self::Ot3 => "ot3",
            Self::HeaterShakerModule => "heater-shaker-module",
            Self::ThermocyclerModule => "thermocycler-module",
            Self::TemperatureModule => "temperature-module",
            Self::MagneticModule => "magnetic-module",
        }
    }

    /// Whether this kind goes in the `robot` slot of a configuration.
    #[must_use]
    pub const fn is_robot(self) -> bool {
        matches!(self, Self::Ot2 | Self::Ot3)
    }

    /// Whether this kind goes in the `modules` list of a configuration.
    #[must_use]
    pub const fn is_module(self) -> bool {
        !self.is_robot()
    }
}

impl fmt::Display for HardwareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
