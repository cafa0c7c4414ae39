//! CAN bus server for OT-3 robots.

use std::collections::BTreeMap;

use emulation_common::constants::CAN_SERVER_MOUNT_NAME;
use emulation_common::error::{EmulationError, Result};
use emulation_common::types::HardwareKind;

use super::{BuildContext, ServiceBuilder};
use crate::image::CAN_SERVER_IMAGES;
use crate::input::model::Source;
use crate::mount::MountCatalog;
use crate::service::BuildSpec;
use crate::source::{BuildArgs, collect_build_args};

/// Service name of the CAN server.
pub const CAN_SERVER_NAME: &str = "can-server";

const PROJECT_ENV: &str = "OPENTRONS_PROJECT";
const PROJECT: &str = "ot3";

/// Builds the CAN server from the OT-3's CAN-server source.
#[derive(Debug)]
pub struct CanServerBuilder<'a> {
    ctx: BuildContext<'a>,
    source: &'a Source,
    mounts: MountCatalog,
    build_args: BuildArgs,
}

impl<'a> CanServerBuilder<'a> {
    /// Looks up the OT-3 robot and its CAN-server source.
    ///
    /// # Errors
    ///
    /// Returns `HardwareDoesNotExist` without a robot, `IncorrectHardware`
    /// for an OT-2 and a configuration error if the OT-3 declares no
    /// CAN-server source.
    pub fn new(ctx: BuildContext<'a>) -> Result<Self> {
        let robot = ctx
            .config
            .robot
            .as_ref()
            .ok_or(EmulationError::HardwareDoesNotExist {
                hardware: HardwareKind::Ot3,
            })?;
        if !robot.is_ot3() {
            return Err(EmulationError::IncorrectHardware {
                found: robot.hardware,
                expected: HardwareKind::Ot3,
            });
        }
        let source = robot
            .can_server_source
            .as_ref()
            .ok_or_else(|| EmulationError::Config {
                message: format!("robot \"{}\" declares no can-server source", robot.id),
            })?;
        let name = ctx.container_name(CAN_SERVER_NAME);
        let mounts =
            MountCatalog::new(&name, &[], &[(CAN_SERVER_MOUNT_NAME, source)], ctx.settings)?;
        let build_args = collect_build_args([source], ctx.settings)?;
        Ok(Self {
            ctx,
            source,
            mounts,
            build_args,
        })
    }
}

impl ServiceBuilder for CanServerBuilder<'_> {
    fn container_name(&self) -> String {
        self.ctx.container_name(CAN_SERVER_NAME)
    }

    fn image(&self) -> &'static str {
        CAN_SERVER_IMAGES.for_source(self.source.source_type())
    }

    fn networks(&self) -> Vec<String> {
        self.ctx.networks.to_vec()
    }

    fn build(&self) -> Option<BuildSpec> {
        if self.source.is_local() {
            return None;
        }
        Some(self.ctx.build_spec(self.image(), self.build_args.clone()))
    }

    fn volumes(&self) -> Vec<String> {
        self.mounts.mount_strings()
    }

    fn env_vars(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(PROJECT_ENV.to_string(), PROJECT.to_string())])
    }
}
