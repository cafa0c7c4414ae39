//! Module emulator services.

use std::collections::BTreeMap;

use emulation_common::error::Result;

use super::{BuildContext, ServiceBuilder, non_empty};
use crate::image::select_image;
use crate::input::model::{HardwareEntity, Module, ProxyInfo};
use crate::mount::MountCatalog;
use crate::service::BuildSpec;
use crate::source::{BuildArgs, collect_build_args};

const SERIAL_NUMBER_ENV: &str = "SERIAL_NUMBER";

/// Builds the service of one declared module.
#[derive(Debug)]
pub struct ModuleBuilder<'a> {
    ctx: BuildContext<'a>,
    module: &'a Module,
    image: &'static str,
    mounts: MountCatalog,
    build_args: BuildArgs,
}

impl<'a> ModuleBuilder<'a> {
    /// Resolves the module's image, mounts and build arguments.
    ///
    /// # Errors
    ///
    /// Returns `EmulationLevelNotSupported` if the kind has no image for the
    /// declared level, or a mount error for invalid user mounts.
    pub fn new(ctx: BuildContext<'a>, module: &'a Module) -> Result<Self> {
        let image = select_image(
            module.hardware,
            module.source.source_type(),
            Some(module.emulation_level),
        )?;
        let mounts = MountCatalog::for_entity(HardwareEntity::Module(module), ctx.settings)?;
        let build_args = collect_build_args([&module.source], ctx.settings)?;
        Ok(Self {
            ctx,
            module,
            image,
            mounts,
            build_args,
        })
    }
}

impl ServiceBuilder for ModuleBuilder<'_> {
    fn container_name(&self) -> String {
        self.ctx.container_name(&self.module.id)
    }

    fn image(&self) -> &'static str {
        self.image
    }

    fn networks(&self) -> Vec<String> {
        self.ctx.networks.to_vec()
    }

    fn build(&self) -> Option<BuildSpec> {
        if self.module.source.is_local() {
            return None;
        }
        Some(self.ctx.build_spec(self.image, self.build_args.clone()))
    }

    fn volumes(&self) -> Vec<String> {
        self.mounts.mount_strings()
    }

    fn command(&self) -> Option<String> {
        self.ctx.companions.emulator_proxy.clone()
    }

    fn depends_on(&self) -> Option<Vec<String>> {
        non_empty(self.ctx.companions.emulator_proxy.iter().cloned().collect())
    }

    fn env_vars(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        let _ = env.insert(
            SERIAL_NUMBER_ENV.to_string(),
            self.module.serial_number.clone(),
        );
        if let Some(info) = ProxyInfo::for_kind(self.module.hardware) {
            let _ = env.insert(info.env_var_name.to_string(), info.env_value());
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use emulation_common::error::EmulationError;
    use emulation_common::types::{EmulationLevel, HardwareKind, Repository};

    use super::*;
    use crate::builder::Companions;
    use crate::builder::testing::{context, local, module, settings};
    use crate::input::model::SystemConfiguration;

    fn config(module: Module) -> SystemConfiguration {
        SystemConfiguration {
            modules: vec![module],
            ..SystemConfiguration::default()
        }
    }

    fn proxy() -> Companions {
        Companions {
            emulator_proxy: Some("emulator-proxy".into()),
            ..Companions::default()
        }
    }

    #[test]
    fn remote_hardware_thermocycler() {
        let cfg = config(module(
            "tc",
            HardwareKind::ThermocyclerModule,
            EmulationLevel::Hardware,
        ));
        let settings = settings();
        let networks = cfg.required_networks();
        let companions = proxy();
        let ctx = context(&cfg, &settings, &networks, &companions);
        let builder = ModuleBuilder::new(ctx, &cfg.modules[0]).expect("builder");

        assert_eq!(builder.image(), "thermocycler-hardware-remote");
        assert_eq!(builder.command().as_deref(), Some("emulator-proxy"));
        assert_eq!(builder.depends_on(), Some(vec!["emulator-proxy".to_string()]));
        assert!(builder.ports().is_none());

        let env = builder.env_vars();
        assert_eq!(env["SERIAL_NUMBER"], "tc-sn");
        assert_eq!(
            env["OT_EMULATOR_thermocycler_proxy"],
            "{\"emulator_port\": 10003, \"driver_port\": 11003}"
        );

        let args = builder.build().expect("build").args;
        assert_eq!(args.len(), 1);
        assert_eq!(
            args["MODULE_SOURCE_DOWNLOAD_LOCATION"],
            settings.repo_head(Repository::OpentronsModules)
        );
    }

    #[test]
    fn local_module_mounts_source_and_volumes() {
        let mut hs = module(
            "hs",
            HardwareKind::HeaterShakerModule,
            EmulationLevel::Hardware,
        );
        hs.source = local(Repository::OpentronsModules, "/src/opentrons-modules");
        let cfg = config(hs);
        let settings = settings();
        let networks = cfg.required_networks();
        let companions = proxy();
        let ctx = context(&cfg, &settings, &networks, &companions);
        let builder = ModuleBuilder::new(ctx, &cfg.modules[0]).expect("builder");

        assert!(builder.build().is_none());
        assert_eq!(builder.image(), "heater-shaker-hardware-local");
        let volumes = builder.volumes();
        assert!(volumes.contains(&"/src/opentrons-modules:/opentrons-modules".to_string()));
        let tools = "opentrons-modules-stm32-tools:/opentrons-modules/stm32-tools";
        assert!(volumes.contains(&tools.to_string()));
    }

    #[test]
    fn unsupported_level_fails_at_construction() {
        let cfg = config(module(
            "temp",
            HardwareKind::TemperatureModule,
            EmulationLevel::Hardware,
        ));
        let settings = settings();
        let networks = cfg.required_networks();
        let companions = proxy();
        let ctx = context(&cfg, &settings, &networks, &companions);
        let err = ModuleBuilder::new(ctx, &cfg.modules[0]).expect_err("should fail");
        assert!(
            matches!(err, EmulationError::EmulationLevelNotSupported { .. }),
            "got: {err}"
        );
    }
}
