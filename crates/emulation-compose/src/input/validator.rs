//! Field-level validation of raw configuration values.
//!
//! Checks identifiers, source locations, nested source pairs, and extra
//! mount paths while the raw document is converted into the model.

use std::path::PathBuf;

use emulation_common::constants::LATEST_KEYWORD;
use emulation_common::error::{EmulationError, Result};
use emulation_common::types::{Repository, SourceType};

use super::RawMount;
use super::model::{Mount, MountType, RemoteRef, Source, SourceLocation};

/// Checks that `value` matches `^[a-zA-Z0-9_-]+$`.
///
/// # Errors
///
/// Returns a configuration error naming `field` otherwise.
pub fn check_identifier(field: &str, value: &str) -> Result<()> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(EmulationError::Config {
            message: format!("{field} \"{value}\" must match ^[a-zA-Z0-9_-]+$"),
        })
    }
}

/// Checks that a commit or branch token is usable as a URL path segment.
fn check_remote_token(token: &str) -> Result<()> {
    let valid = !token.is_empty()
        && !token.starts_with('/')
        && !token.contains("..")
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'));
    if valid {
        Ok(())
    } else {
        Err(EmulationError::Config {
            message: format!("\"{token}\" is not a valid commit or branch identifier"),
        })
    }
}

/// Resolves a declared source type and location into a [`Source`].
///
/// # Errors
///
/// Returns `LocalSourceDoesNotExist` if a local location is not a
/// directory, or a configuration error for a malformed remote token.
pub fn resolve_source(
    repository: Repository,
    source_type: SourceType,
    location: &str,
) -> Result<Source> {
    let location = match source_type {
        SourceType::Local => {
            let path = PathBuf::from(location);
            if !path.is_dir() {
                return Err(EmulationError::LocalSourceDoesNotExist { path });
            }
            SourceLocation::Local(path)
        }
        SourceType::Remote if location == LATEST_KEYWORD => {
            SourceLocation::Remote(RemoteRef::Latest)
        }
        SourceType::Remote => {
            check_remote_token(location)?;
            SourceLocation::Remote(RemoteRef::Commit(location.to_string()))
        }
    };
    Ok(Source {
        repository,
        location,
    })
}

/// Resolves an optional nested source declared as a type/location pair.
///
/// # Errors
///
/// Returns a configuration error if only one half of the pair is present.
pub fn resolve_nested_source(
    entity: &str,
    prefix: &str,
    repository: Repository,
    source_type: Option<SourceType>,
    location: Option<&str>,
) -> Result<Option<Source>> {
    match (source_type, location) {
        (Some(source_type), Some(location)) => {
            resolve_source(repository, source_type, location).map(Some)
        }
        (None, None) => Ok(None),
        (Some(_), None) => Err(EmulationError::Config {
            message: format!(
                "\"{entity}\" sets {prefix}-source-type without {prefix}-source-location"
            ),
        }),
        (None, Some(_)) => Err(EmulationError::Config {
            message: format!(
                "\"{entity}\" sets {prefix}-source-location without {prefix}-source-type"
            ),
        }),
    }
}

/// Converts a raw extra mount, checking its host path.
///
/// # Errors
///
/// Returns `MountSourceMissing` if the host path is not an existing
/// file or directory of the declared type.
pub fn resolve_mount(raw: RawMount) -> Result<Mount> {
    let exists = match raw.mount_type {
        MountType::File => raw.source_path.is_file(),
        MountType::Directory => raw.source_path.is_dir(),
    };
    if !exists {
        return Err(EmulationError::MountSourceMissing {
            name: raw.name,
            path: raw.source_path,
        });
    }
    Ok(Mount {
        name: raw.name,
        mount_type: raw.mount_type,
        source_path: raw.source_path,
        mount_path: raw.mount_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_accepts_dash_and_underscore() {
        assert!(check_identifier("id", "my_ot3-1").is_ok());
    }

    #[test]
    fn identifier_rejects_spaces_and_empty() {
        let err = check_identifier("id", "my robot").expect_err("should fail");
        assert!(err.to_string().contains("my robot"), "got: {err}");
        assert!(check_identifier("id", "").is_err());
    }

    #[test]
    fn latest_keyword_resolves_to_head() {
        let source =
            resolve_source(Repository::Opentrons, SourceType::Remote, "latest").expect("resolve");
        assert_eq!(source.location, SourceLocation::Remote(RemoteRef::Latest));
    }

    #[test]
    fn branch_token_with_slash_is_accepted() {
        let source = resolve_source(Repository::Opentrons, SourceType::Remote, "release/7.0")
            .expect("resolve");
        assert_eq!(
            source.location,
            SourceLocation::Remote(RemoteRef::Commit("release/7.0".into()))
        );
    }

    #[test]
    fn malformed_remote_token_fails() {
        for token in ["", "../edge", "/edge", "edge branch", "a?b"] {
            assert!(
                resolve_source(Repository::Opentrons, SourceType::Remote, token).is_err(),
                "{token} should be rejected"
            );
        }
    }

    #[test]
    fn missing_local_directory_fails() {
        let err = resolve_source(
            Repository::Opentrons,
            SourceType::Local,
            "/definitely/not/a/checkout",
        )
        .expect_err("should fail");
        assert!(
            matches!(err, EmulationError::LocalSourceDoesNotExist { .. }),
            "got: {err}"
        );
    }

    #[test]
    fn existing_local_directory_resolves() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = resolve_source(
            Repository::Opentrons,
            SourceType::Local,
            &dir.path().to_string_lossy(),
        )
        .expect("resolve");
        assert_eq!(source.local_path(), Some(dir.path()));
    }

    #[test]
    fn half_declared_nested_source_fails() {
        let err = resolve_nested_source(
            "ot3",
            "can-server",
            Repository::Opentrons,
            Some(SourceType::Remote),
            None,
        )
        .expect_err("should fail");
        assert!(err.to_string().contains("can-server-source-location"), "got: {err}");
        let absent =
            resolve_nested_source("ot3", "can-server", Repository::Opentrons, None, None)
                .expect("absent pair is fine");
        assert!(absent.is_none());
    }

    #[test]
    fn mount_with_wrong_type_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let raw = RawMount {
            name: "LOGS".into(),
            mount_type: MountType::File,
            source_path: dir.path().to_path_buf(),
            mount_path: "/var/log".into(),
        };
        let err = resolve_mount(raw).expect_err("directory is not a file");
        assert!(matches!(err, EmulationError::MountSourceMissing { .. }));
    }
}
