//! Helper services compiling a local checkout inside the fleet's shared
//! build-cache volumes.

use emulation_common::constants::SOURCE_CODE_MOUNT_NAME;
use emulation_common::error::{EmulationError, Result};
use emulation_common::types::Repository;

use super::{BuildContext, ServiceBuilder};
use crate::image::builder_image;
use crate::mount::MountCatalog;
use crate::service::{BuildSpec, HealthCheck};

/// Builds the helper of one repository with a local source.
#[derive(Debug)]
pub struct LocalSourceBuilder<'a> {
    ctx: BuildContext<'a>,
    repository: Repository,
    mounts: MountCatalog,
    source_dir: String,
}

impl<'a> LocalSourceBuilder<'a> {
    /// Mounts the first local source of `repository` in declaration order.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no entity declares a local source
    /// of `repository`.
    pub fn new(ctx: BuildContext<'a>, repository: Repository) -> Result<Self> {
        let source = ctx
            .config
            .first_local_source(repository)
            .ok_or_else(|| EmulationError::Config {
                message: format!("no local source of \"{repository}\" is declared"),
            })?;
        let name = ctx.container_name(builder_image(repository));
        let mounts =
            MountCatalog::new(&name, &[], &[(SOURCE_CODE_MOUNT_NAME, source)], ctx.settings)?;
        let source_dir = mounts
            .get_mount_by_name(SOURCE_CODE_MOUNT_NAME)?
            .mount_path
            .clone();
        Ok(Self {
            ctx,
            repository,
            mounts,
            source_dir,
        })
    }
}

impl ServiceBuilder for LocalSourceBuilder<'_> {
    fn container_name(&self) -> String {
        self.ctx.container_name(builder_image(self.repository))
    }

    fn image(&self) -> &'static str {
        builder_image(self.repository)
    }

    fn networks(&self) -> Vec<String> {
        self.ctx.networks.to_vec()
    }

    fn build(&self) -> Option<BuildSpec> {
        None
    }

    fn volumes(&self) -> Vec<String> {
        self.mounts.mount_strings()
    }

    fn health_check(&self) -> Option<HealthCheck> {
        Some(HealthCheck::directories_exist([self.source_dir.as_str()]))
    }
}
