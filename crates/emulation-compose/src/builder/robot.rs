//! Robot server service.

use std::collections::BTreeMap;

use emulation_common::constants::SMOOTHIE_PORT;
use emulation_common::error::Result;

use super::{BuildContext, ServiceBuilder, non_empty};
use crate::image::select_image;
use crate::input::model::{HardwareEntity, Robot};
use crate::mount::MountCatalog;
use crate::service::BuildSpec;
use crate::source::{BuildArgs, collect_build_args};

const MODULE_SERVER_ENV: &str = "OT_EMULATOR_module_server";
const SMOOTHIE_URI_ENV: &str = "OT_SMOOTHIE_EMULATOR_URI";
const OT3_HARDWARE_CONTROLLER_FLAG: &str = "OT_API_FF_enableOT3HardwareController";
const CAN_DRIVER_INTERFACE_ENV: &str = "OT3_CAN_DRIVER_interface";
const CAN_DRIVER_HOST_ENV: &str = "OT3_CAN_DRIVER_host";
const CAN_DRIVER_INTERFACE: &str = "opentrons_sock";

/// Builds the service of the declared robot.
#[derive(Debug)]
pub struct RobotBuilder<'a> {
    ctx: BuildContext<'a>,
    robot: &'a Robot,
    image: &'static str,
    mounts: MountCatalog,
    build_args: BuildArgs,
}

impl<'a> RobotBuilder<'a> {
    /// Resolves the robot's image, mounts and build arguments.
    ///
    /// # Errors
    ///
    /// Returns a mount error for invalid user mounts, or
    /// `BuildArgConflict` if nested sources disagree on a build argument.
    pub fn new(ctx: BuildContext<'a>, robot: &'a Robot) -> Result<Self> {
        let entity = HardwareEntity::Robot(robot);
        let image = select_image(robot.hardware, robot.source.source_type(), None)?;
        let mounts = MountCatalog::for_entity(entity, ctx.settings)?;
        let build_args = collect_build_args(
            entity.sources().into_iter().map(|(_, source)| source),
            ctx.settings,
        )?;
        Ok(Self {
            ctx,
            robot,
            image,
            mounts,
            build_args,
        })
    }
}

impl ServiceBuilder for RobotBuilder<'_> {
    fn container_name(&self) -> String {
        self.ctx.container_name(&self.robot.id)
    }

    fn image(&self) -> &'static str {
        self.image
    }

    fn networks(&self) -> Vec<String> {
        self.ctx.networks.to_vec()
    }

    fn build(&self) -> Option<BuildSpec> {
        if self.robot.source.is_local() {
            return None;
        }
        Some(self.ctx.build_spec(self.image, self.build_args.clone()))
    }

    fn volumes(&self) -> Vec<String> {
        self.mounts.mount_strings()
    }

    fn ports(&self) -> Option<Vec<String>> {
        Some(vec![self.robot.port_binding()])
    }

    fn depends_on(&self) -> Option<Vec<String>> {
        let companions = self.ctx.companions;
        let mut deps: Vec<String> = companions.emulator_proxy.iter().cloned().collect();
        if self.robot.is_ot3() {
            deps.extend(companions.can_server.iter().cloned());
        } else {
            deps.extend(companions.smoothie.iter().cloned());
        }
        non_empty(deps)
    }

    fn env_vars(&self) -> BTreeMap<String, String> {
        let companions = self.ctx.companions;
        let mut env = BTreeMap::new();
        if let Some(proxy) = &companions.emulator_proxy {
            let _ = env.insert(
                MODULE_SERVER_ENV.to_string(),
                format!("{{\"host\": \"{proxy}\"}}"),
            );
        }
        if self.robot.is_ot3() {
            let _ = env.insert(OT3_HARDWARE_CONTROLLER_FLAG.to_string(), "true".to_string());
            if let Some(can) = &companions.can_server {
                let _ = env.insert(
                    CAN_DRIVER_INTERFACE_ENV.to_string(),
                    CAN_DRIVER_INTERFACE.to_string(),
                );
                let _ = env.insert(CAN_DRIVER_HOST_ENV.to_string(), can.clone());
            }
        } else if let Some(smoothie) = &companions.smoothie {
            let _ = env.insert(
                SMOOTHIE_URI_ENV.to_string(),
                format!("socket://{smoothie}:{SMOOTHIE_PORT}"),
            );
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use emulation_common::types::{HardwareKind, Repository};

    use super::*;
    use crate::builder::testing::{context, local, robot, settings};
    use crate::builder::Companions;
    use crate::input::model::{Source, SystemConfiguration};

    fn config(robot: Robot) -> SystemConfiguration {
        SystemConfiguration {
            robot: Some(robot),
            ..SystemConfiguration::default()
        }
    }

    #[test]
    fn remote_ot2_with_companions() {
        let cfg = config(robot(
            "ot2",
            HardwareKind::Ot2,
            Source::remote_latest(Repository::Opentrons),
        ));
        let settings = settings();
        let networks = cfg.required_networks();
        let companions = Companions {
            emulator_proxy: Some("emulator-proxy".into()),
            smoothie: Some("smoothie".into()),
            can_server: None,
        };
        let ctx = context(&cfg, &settings, &networks, &companions);
        let builder = RobotBuilder::new(ctx, cfg.robot.as_ref().expect("robot")).expect("builder");

        assert_eq!(builder.container_name(), "ot2");
        assert_eq!(builder.image(), "robot-server-remote");
        assert_eq!(builder.ports(), Some(vec!["31950:31950".to_string()]));
        assert_eq!(
            builder.depends_on(),
            Some(vec!["emulator-proxy".to_string(), "smoothie".to_string()])
        );
        let env = builder.env_vars();
        assert_eq!(env["OT_EMULATOR_module_server"], "{\"host\": \"emulator-proxy\"}");
        assert_eq!(env["OT_SMOOTHIE_EMULATOR_URI"], "socket://smoothie:11000");

        let build = builder.build().expect("remote source builds");
        assert_eq!(build.target, "robot-server-remote");
        assert_eq!(build.dockerfile, "Dockerfile");
        assert_eq!(
            build.args["OPENTRONS_SOURCE_DOWNLOAD_LOCATION"],
            settings.repo_head(Repository::Opentrons)
        );
    }

    #[test]
    fn local_ot2_has_no_build_and_mounts_source() {
        let cfg = config(robot(
            "ot2",
            HardwareKind::Ot2,
            local(Repository::Opentrons, "/src/opentrons"),
        ));
        let settings = settings();
        let networks = cfg.required_networks();
        let companions = Companions::default();
        let ctx = context(&cfg, &settings, &networks, &companions);
        let builder = RobotBuilder::new(ctx, cfg.robot.as_ref().expect("robot")).expect("builder");

        assert!(builder.build().is_none());
        assert_eq!(builder.image(), "robot-server-local");
        assert!(builder.volumes().contains(&"/src/opentrons:/opentrons".to_string()));
        assert!(builder.depends_on().is_none());
        assert!(builder.env_vars().is_empty());
    }

    #[test]
    fn ot3_env_always_enables_hardware_controller() {
        let mut ot3 = robot(
            "ot3",
            HardwareKind::Ot3,
            Source::remote_latest(Repository::Opentrons),
        );
        ot3.hardware_controller_source = Some(Source::remote_latest(Repository::Ot3Firmware));
        let cfg = config(ot3);
        let settings = settings();
        let networks = cfg.required_networks();
        let companions = Companions::default();
        let ctx = context(&cfg, &settings, &networks, &companions);
        let builder = RobotBuilder::new(ctx, cfg.robot.as_ref().expect("robot")).expect("builder");

        let env = builder.env_vars();
        assert_eq!(env.len(), 1);
        assert_eq!(env["OT_API_FF_enableOT3HardwareController"], "true");
        assert_eq!(builder.networks(), vec!["local-network", "can-network"]);
        let args = builder.build().expect("build").args;
        assert!(args.contains_key("OPENTRONS_SOURCE_DOWNLOAD_LOCATION"));
        assert!(args.contains_key("FIRMWARE_SOURCE_DOWNLOAD_LOCATION"));
    }

    #[test]
    fn ot3_with_can_server() {
        let mut ot3 = robot(
            "ot3",
            HardwareKind::Ot3,
            Source::remote_latest(Repository::Opentrons),
        );
        ot3.can_server_source = Some(Source::remote_latest(Repository::Opentrons));
        let mut cfg = config(ot3);
        cfg.system_unique_id = Some("bench".into());
        let settings = settings();
        let networks = cfg.required_networks();
        let companions = Companions {
            can_server: Some("bench-can-server".into()),
            ..Companions::default()
        };
        let ctx = context(&cfg, &settings, &networks, &companions);
        let builder = RobotBuilder::new(ctx, cfg.robot.as_ref().expect("robot")).expect("builder");

        assert_eq!(builder.container_name(), "bench-ot3");
        assert_eq!(builder.depends_on(), Some(vec!["bench-can-server".to_string()]));
        let env = builder.env_vars();
        assert_eq!(env["OT3_CAN_DRIVER_interface"], "opentrons_sock");
        assert_eq!(env["OT3_CAN_DRIVER_host"], "bench-can-server");
    }

    #[test]
    fn dev_mode_uses_dev_dockerfile() {
        let cfg = config(robot(
            "ot2",
            HardwareKind::Ot2,
            Source::remote_latest(Repository::Opentrons),
        ));
        let settings = settings();
        let networks = cfg.required_networks();
        let companions = Companions::default();
        let mut ctx = context(&cfg, &settings, &networks, &companions);
        ctx.dev = true;
        let builder = RobotBuilder::new(ctx, cfg.robot.as_ref().expect("robot")).expect("builder");
        assert_eq!(builder.build().expect("build").dockerfile, "dev_Dockerfile");
    }
}
