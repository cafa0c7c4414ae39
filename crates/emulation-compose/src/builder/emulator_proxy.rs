//! Emulator proxy service relaying module emulators to the robot.

use std::collections::BTreeMap;

use emulation_common::constants::SOURCE_CODE_MOUNT_NAME;
use emulation_common::error::Result;
use emulation_common::types::Repository;

use super::{BuildContext, ServiceBuilder};
use crate::image::EMULATOR_PROXY_IMAGES;
use crate::input::model::{ProxyInfo, Source};
use crate::mount::MountCatalog;
use crate::service::BuildSpec;
use crate::source::{BuildArgs, collect_build_args};

/// Service name of the emulator proxy.
pub const EMULATOR_PROXY_NAME: &str = "emulator-proxy";

/// Builds the fleet's single emulator proxy.
#[derive(Debug)]
pub struct EmulatorProxyBuilder<'a> {
    ctx: BuildContext<'a>,
    source: Source,
    mounts: MountCatalog,
    build_args: BuildArgs,
}

impl<'a> EmulatorProxyBuilder<'a> {
    /// Uses the robot's own source, or the `opentrons` head without a robot.
    ///
    /// # Errors
    ///
    /// Never fails for a validated configuration; errors are propagated
    /// from mount and build-argument resolution.
    pub fn new(ctx: BuildContext<'a>) -> Result<Self> {
        let source = ctx.config.robot.as_ref().map_or_else(
            || Source::remote_latest(Repository::Opentrons),
            |robot| robot.source.clone(),
        );
        let name = ctx.container_name(EMULATOR_PROXY_NAME);
        let mounts =
            MountCatalog::new(&name, &[], &[(SOURCE_CODE_MOUNT_NAME, &source)], ctx.settings)?;
        let build_args = collect_build_args([&source], ctx.settings)?;
        Ok(Self {
            ctx,
            source,
            mounts,
            build_args,
        })
    }
}

impl ServiceBuilder for EmulatorProxyBuilder<'_> {
    fn container_name(&self) -> String {
        self.ctx.container_name(EMULATOR_PROXY_NAME)
    }

    fn image(&self) -> &'static str {
        EMULATOR_PROXY_IMAGES.for_source(self.source.source_type())
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
        ProxyInfo::ALL
            .iter()
            .map(|info| (info.env_var_name.to_string(), info.env_value()))
            .collect()
    }
}
