//! Source reference resolution.
//!
//! Remote sources become a single build argument pointing the image build
//! at an archive URL. Local sources produce no build argument; they are
//! bind-mounted instead (see [`crate::mount`]).

use std::collections::BTreeMap;

use emulation_common::config::EmulationSettings;
use emulation_common::constants::{COMMIT_SHA_PLACEHOLDER, LATEST_KEYWORD};
use emulation_common::error::{EmulationError, Result};
use emulation_common::types::Repository;

use crate::input::model::{RemoteRef, Source, SourceLocation};

/// Build arguments of one service, keyed by argument name.
pub type BuildArgs = BTreeMap<String, String>;

/// Resolves a download location into a build argument.
///
/// `"latest"` yields `head` verbatim; anything else yields `commit` with
/// every `{{commit-sha}}` replaced by `location`.
#[must_use]
pub fn resolve_build_arg(
    repository: Repository,
    location: &str,
    head: &str,
    commit: &str,
) -> (String, String) {
    let value = if location == LATEST_KEYWORD {
        head.to_string()
    } else {
        commit.replace(COMMIT_SHA_PLACEHOLDER, location)
    };
    (repository.build_arg_name().to_string(), value)
}

/// Resolves the build argument of `source`, `None` for local sources.
#[must_use]
pub fn source_build_arg(source: &Source, settings: &EmulationSettings) -> Option<(String, String)> {
    let location = match &source.location {
        SourceLocation::Local(_) => return None,
        SourceLocation::Remote(RemoteRef::Latest) => LATEST_KEYWORD,
        SourceLocation::Remote(RemoteRef::Commit(token)) => token.as_str(),
    };
    let repo = source.repository;
    Some(resolve_build_arg(
        repo,
        location,
        settings.repo_head(repo),
        settings.repo_commit(repo),
    ))
}

/// Adds `(key, value)` to `args`.
///
/// # Errors
///
/// Returns `BuildArgConflict` if `key` is already bound to a different value.
pub fn merge_build_arg(args: &mut BuildArgs, key: String, value: String) -> Result<()> {
    match args.get(&key) {
        Some(existing) if *existing != value => Err(EmulationError::BuildArgConflict {
            key,
            existing: existing.clone(),
            incoming: value,
        }),
        Some(_) => Ok(()),
        None => {
            let _ = args.insert(key, value);
            Ok(())
        }
    }
}

/// Merges the build arguments of every remote source in `sources`.
///
/// # Errors
///
/// Returns `BuildArgConflict` if two sources disagree on one argument.
pub fn collect_build_args<'a>(
    sources: impl IntoIterator<Item = &'a Source>,
    settings: &EmulationSettings,
) -> Result<BuildArgs> {
    let mut args = BuildArgs::new();
    for source in sources {
        if let Some((key, value)) = source_build_arg(source, settings) {
            tracing::debug!(key = %key, value = %value, "resolved build argument");
            merge_build_arg(&mut args, key, value)?;
        }
    }
    Ok(args)
}
