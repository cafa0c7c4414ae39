//! Smoothie motion-controller emulator for OT-2 robots.

use emulation_common::constants::SOURCE_CODE_MOUNT_NAME;
use emulation_common::error::{EmulationError, Result};
use emulation_common::types::HardwareKind;

use super::{BuildContext, ServiceBuilder};
use crate::image::SMOOTHIE_IMAGES;
use crate::input::model::Robot;
use crate::mount::MountCatalog;
use crate::service::BuildSpec;
use crate::source::{BuildArgs, collect_build_args};

/// Service name of the smoothie emulator.
pub const SMOOTHIE_NAME: &str = "smoothie";

/// Builds the smoothie emulator from the OT-2's own source.
#[derive(Debug)]
pub struct SmoothieBuilder<'a> {
    ctx: BuildContext<'a>,
    robot: &'a Robot,
    mounts: MountCatalog,
    build_args: BuildArgs,
}

impl<'a> SmoothieBuilder<'a> {
    /// Looks up the OT-2 robot.
    ///
    /// # Errors
    ///
    /// Returns `HardwareDoesNotExist` without a robot and
    /// `IncorrectHardware` for an OT-3.
    pub fn new(ctx: BuildContext<'a>) -> Result<Self> {
        let robot = ctx
            .config
            .robot
            .as_ref()
            .ok_or(EmulationError::HardwareDoesNotExist {
                hardware: HardwareKind::Ot2,
            })?;
        if robot.hardware != HardwareKind::Ot2 {
            return Err(EmulationError::IncorrectHardware {
                found: robot.hardware,
                expected: HardwareKind::Ot2,
            });
        }
        let name = ctx.container_name(SMOOTHIE_NAME);
        let mounts = MountCatalog::new(
            &name,
            &[],
            &[(SOURCE_CODE_MOUNT_NAME, &robot.source)],
            ctx.settings,
        )?;
        let build_args = collect_build_args([&robot.source], ctx.settings)?;
        Ok(Self {
            ctx,
            robot,
            mounts,
            build_args,
        })
    }
}

impl ServiceBuilder for SmoothieBuilder<'_> {
    fn container_name(&self) -> String {
        self.ctx.container_name(SMOOTHIE_NAME)
    }

    fn image(&self) -> &'static str {
        SMOOTHIE_IMAGES.for_source(self.robot.source.source_type())
    }

    fn networks(&self) -> Vec<String> {
        self.ctx.networks.to_vec()
    }

    fn build(&self) -> Option<BuildSpec> {
        if self.robot.source.is_local() {
            return None;
        }
        Some(self.ctx.build_spec(self.image(), self.build_args.clone()))
    }

    fn volumes(&self) -> Vec<String> {
        self.mounts.mount_strings()
    }
}

#[cfg(test)]
mod tests {
    use emulation_common::types::Repository;

    use super::*;
    use crate::builder::Companions;
    use crate::builder::testing::{context, robot, settings};
    use crate::input::model::{Source, SystemConfiguration};

    fn build(cfg: &SystemConfiguration) -> Result<String> {
        let settings = settings();
        let networks = cfg.required_networks();
        let companions = Companions::default();
        SmoothieBuilder::new(context(cfg, &settings, &networks, &companions))
            .map(|b| b.image().to_string())
    }

    #[test]
    fn ot2_gets_smoothie() {
        let cfg = SystemConfiguration {
            robot: Some(robot(
                "ot2",
                HardwareKind::Ot2,
                Source::remote_latest(Repository::Opentrons),
            )),
            system_unique_id: Some("lab".into()),
            ..SystemConfiguration::default()
        };
        let settings = settings();
        let networks = cfg.required_networks();
        let companions = Companions::default();
        let builder = SmoothieBuilder::new(context(&cfg, &settings, &networks, &companions))
            .expect("builder");
        assert_eq!(builder.container_name(), "lab-smoothie");
        assert_eq!(builder.image(), "smoothie-remote");
        assert!(builder.env_vars().is_empty());
        assert!(builder.build().is_some());
    }

    #[test]
    fn no_robot_is_hardware_does_not_exist() {
        let err = build(&SystemConfiguration::default()).expect_err("should fail");
        assert!(
            matches!(err, EmulationError::HardwareDoesNotExist { hardware: HardwareKind::Ot2 }),
            "got: {err}"
        );
    }

    #[test]
    fn ot3_is_incorrect_hardware() {
        let cfg = SystemConfiguration {
            robot: Some(robot(
                "ot3",
                HardwareKind::Ot3,
                Source::remote_latest(Repository::Opentrons),
            )),
            ..SystemConfiguration::default()
        };
        let err = build(&cfg).expect_err("should fail");
        assert!(
            matches!(
                err,
                EmulationError::IncorrectHardware {
                    found: HardwareKind::Ot3,
                    expected: HardwareKind::Ot2
                }
            ),
            "got: {err}"
        );
    }
}
