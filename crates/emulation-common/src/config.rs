//! Global settings model: where to download sources from and where the
//! Dockerfiles live.
//!
//! Settings are always passed explicitly to the components that need them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DOCKER_DIRECTORY, DEFAULT_ENTRYPOINT_NAME};
use crate::error::{EmulationError, Result};
use crate::types::Repository;

/// Root settings for compose generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EmulationSettings {
    /// Directory holding the Dockerfiles and the entrypoint script.
    #[serde(default = "default_docker_directory")]
    pub docker_directory: PathBuf,
    /// Head and commit URL templates per repository.
    pub source_download_locations: SourceDownloadLocations,
}

/// URL templates used to download repository archives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDownloadLocations {
    /// Archive URL of each repository's default branch.
    pub heads: RepositoryUrls,
    /// Archive URL templates containing the `{{commit-sha}}` placeholder.
    pub commits: RepositoryUrls,
}

/// One URL per repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositoryUrls {
    /// `opentrons` URL.
    pub opentrons: String,
    /// `ot3-firmware` URL.
    pub ot3_firmware: String,
    /// `opentrons-modules` URL.
    #[serde(alias = "modules")]
    pub opentrons_modules: String,
}

impl RepositoryUrls {
    /// Returns the URL for `repo`.
    #[must_use]
    pub fn get(&self, repo: Repository) -> &str {
        match repo {
            Repository::Opentrons => &self.opentrons,
            Repository::Ot3Firmware => &self.ot3_firmware,
            Repository::OpentronsModules => &self.opentrons_modules,
        }
    }
}

fn default_docker_directory() -> PathBuf {
    PathBuf::from(DEFAULT_DOCKER_DIRECTORY)
}

impl EmulationSettings {
    /// Loads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading emulation settings");
        let content = std::fs::read_to_string(path).map_err(|e| EmulationError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Returns the head archive URL for `repo`.
    #[must_use]
    pub fn repo_head(&self, repo: Repository) -> &str {
        self.source_download_locations.heads.get(repo)
    }

    /// Returns the commit archive URL template for `repo`.
    #[must_use]
    pub fn repo_commit(&self, repo: Repository) -> &str {
        self.source_download_locations.commits.get(repo)
    }

    /// Returns the host path of the shared entrypoint script.
    #[must_use]
    pub fn entrypoint_path(&self) -> PathBuf {
        self.docker_directory.join(DEFAULT_ENTRYPOINT_NAME)
    }
}

impl Default for EmulationSettings {
    fn default() -> Self {
        Self {
            docker_directory: default_docker_directory(),
            source_download_locations: SourceDownloadLocations {
                heads: RepositoryUrls {
                    opentrons: "https://github.com/Opentrons/opentrons/archive/refs/heads/edge.zip"
                        .into(),
                    ot3_firmware:
                        "https://github.com/Opentrons/ot3-firmware/archive/refs/heads/main.zip"
                            .into(),
                    opentrons_modules:
                        "https://github.com/Opentrons/opentrons-modules/archive/refs/heads/edge.zip"
                            .into(),
                },
                commits: RepositoryUrls {
                    opentrons: "https://github.com/Opentrons/opentrons/archive/{{commit-sha}}.zip"
                        .into(),
                    ot3_firmware:
                        "https://github.com/Opentrons/ot3-firmware/archive/{{commit-sha}}.zip"
                            .into(),
                    opentrons_modules:
                        "https://github.com/Opentrons/opentrons-modules/archive/{{commit-sha}}.zip"
                            .into(),
                },
            },
        }
    }
}
