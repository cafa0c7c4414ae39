//! Mount catalog for one service.
//!
//! Collects user-declared mounts, auto-derived source mounts, the shared
//! entrypoint script and the build-cache named volumes of every repository
//! whose checkout ends up mounted.

use std::collections::HashSet;
use std::path::Path;

use emulation_common::config::EmulationSettings;
use emulation_common::constants::{
    ENTRYPOINT_CONTAINER_PATH, ENTRYPOINT_MOUNT_NAME, RESTRICTED_MOUNT_NAMES,
};
use emulation_common::error::{EmulationError, Result};
use emulation_common::types::Repository;

use crate::input::model::{HardwareEntity, Mount, MountType, Source};

/// A named docker volume attached to a container path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedVolume {
    /// Volume name.
    pub name: &'static str,
    /// Container-side path.
    pub mount_path: &'static str,
}

impl NamedVolume {
    /// Renders the volume as a compose `name:container` string.
    #[must_use]
    pub fn volume_string(&self) -> String {
        format!("{}:{}", self.name, self.mount_path)
    }
}

/// Build-cache volumes kept for a repository's checkout.
#[must_use]
pub const fn repository_named_volumes(repo: Repository) -> &'static [NamedVolume] {
    match repo {
        Repository::Opentrons => &[NamedVolume {
            name: "opentrons-python-dist",
            mount_path: "/dist",
        }],
        Repository::Ot3Firmware => &[
            NamedVolume {
                name: "ot3-firmware-build-host",
                mount_path: "/ot3-firmware/build-host",
            },
            NamedVolume {
                name: "ot3-firmware-stm32-tools",
                mount_path: "/ot3-firmware/stm32-tools",
            },
        ],
        Repository::OpentronsModules => &[
            NamedVolume {
                name: "opentrons-modules-build-stm32-host",
                mount_path: "/opentrons-modules/build-stm32-host",
            },
            NamedVolume {
                name: "opentrons-modules-stm32-tools",
                mount_path: "/opentrons-modules/stm32-tools",
            },
        ],
    }
}

/// Returns whether a compose volume string refers to a named volume.
#[must_use]
pub fn is_named_volume(volume: &str) -> bool {
    volume.split_once(':').is_some_and(|(host, _)| {
        !host.is_empty() && !host.contains('/') && !host.starts_with('.') && !host.starts_with('~')
    })
}

/// Every mount of one service, in a reproducible order.
#[derive(Debug, Clone)]
pub struct MountCatalog {
    declared: Vec<Mount>,
    entrypoint: Mount,
    named_volumes: Vec<NamedVolume>,
}

impl MountCatalog {
    /// Builds the catalog of a declared entity and its mounted sources.
    ///
    /// # Errors
    ///
    /// Returns a mount error if a user mount reuses a reserved name, two
    /// user mounts share a name, or two host paths meet at one container path.
    pub fn for_entity(entity: HardwareEntity<'_>, settings: &EmulationSettings) -> Result<Self> {
        Self::new(
            entity.id(),
            entity.extra_mounts(),
            &entity.mounted_sources(),
            settings,
        )
    }

    /// Builds a catalog from user mounts and `(mount name, source)` pairs.
    ///
    /// Each local source contributes a directory mount at
    /// `/<basename of its location>`; remote sources contribute nothing.
    /// A source already mounted at the same container path is mounted once.
    ///
    /// # Errors
    ///
    /// Returns a mount error if a user mount reuses a reserved name, two
    /// user mounts share a name, or two host paths meet at one container path.
    pub fn new(
        entity: &str,
        extra_mounts: &[Mount],
        sources: &[(&str, &Source)],
        settings: &EmulationSettings,
    ) -> Result<Self> {
        check_user_mounts(entity, extra_mounts)?;

        let mut declared = extra_mounts.to_vec();
        for (name, source) in sources {
            if let Some(path) = source.local_path() {
                let mount = source_mount(name, path, source.repository);
                let existing = declared
                    .iter()
                    .find(|m| m.mount_path == mount.mount_path)
                    .map(|m| m.source_path.clone());
                match existing {
                    Some(first) if first == mount.source_path => {
                        tracing::debug!(
                            entity,
                            mount_path = %mount.mount_path,
                            "source already mounted"
                        );
                    }
                    Some(first) => {
                        return Err(EmulationError::MountPathConflict {
                            entity: entity.to_string(),
                            mount_path: mount.mount_path,
                            first,
                            second: mount.source_path,
                        });
                    }
                    None => declared.push(mount),
                }
            }
        }

        let entrypoint = Mount {
            name: ENTRYPOINT_MOUNT_NAME.to_string(),
            mount_type: MountType::File,
            source_path: settings.entrypoint_path(),
            mount_path: ENTRYPOINT_CONTAINER_PATH.to_string(),
        };

        let named_volumes = Repository::ALL
            .into_iter()
            .filter(|repo| declared.iter().any(|m| mounts_repository(m, *repo)))
            .flat_map(|repo| repository_named_volumes(repo).iter().cloned())
            .collect();

        Ok(Self {
            declared,
            entrypoint,
            named_volumes,
        })
    }

    /// Looks up a declared or source mount by name.
    ///
    /// # Errors
    ///
    /// Returns `NoMountsDefined` if the entity has no such mounts at all,
    /// or `MountNotFound` if none carries `name`.
    pub fn get_mount_by_name(&self, name: &str) -> Result<&Mount> {
        if self.declared.is_empty() {
            return Err(EmulationError::NoMountsDefined);
        }
        self.declared
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| EmulationError::MountNotFound {
                name: name.to_string(),
            })
    }

    /// Named volumes attached by this catalog.
    #[must_use]
    pub fn named_volumes(&self) -> &[NamedVolume] {
        &self.named_volumes
    }

    /// Renders every mount: bind mounts, entrypoint, then named volumes.
    #[must_use]
    pub fn mount_strings(&self) -> Vec<String> {
        self.declared
            .iter()
            .chain(std::iter::once(&self.entrypoint))
            .map(Mount::bind_mount_string)
            .chain(self.named_volumes.iter().map(NamedVolume::volume_string))
            .collect()
    }
}

fn check_user_mounts(entity: &str, mounts: &[Mount]) -> Result<()> {
    let mut seen = HashSet::new();
    for mount in mounts {
        if RESTRICTED_MOUNT_NAMES.contains(&mount.name.as_str()) {
            return Err(EmulationError::ReservedMountName {
                name: mount.name.clone(),
            });
        }
        if !seen.insert(mount.name.as_str()) {
            return Err(EmulationError::DuplicateMountName {
                entity: entity.to_string(),
                name: mount.name.clone(),
            });
        }
    }
    Ok(())
}

fn source_mount(name: &str, path: &Path, repo: Repository) -> Mount {
    let dir = path
        .file_name()
        .map_or_else(|| repo.name().to_string(), |n| n.to_string_lossy().into_owned());
    Mount {
        name: name.to_string(),
        mount_type: MountType::Directory,
        source_path: path.to_path_buf(),
        mount_path: format!("/{dir}"),
    }
}

fn mounts_repository(mount: &Mount, repo: Repository) -> bool {
    let root = repo.container_path();
    mount.mount_path == root
        || mount
            .mount_path
            .strip_prefix(root.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
}
