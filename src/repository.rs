// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Locations of the upstream checkouts.
//!
//! A checkout comes from its override variable when that points to an
//! existing directory, otherwise it is cloned under the repositories
//! directory.

use std::{
    collections::BTreeMap,
    env,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{
    component::Distribution,
    error::Error,
    git::GitRepository,
    version::Version,
};

/// Default directory holding cloned repositories.
pub const DEFAULT_REPOS_DIR: &str = "tmp_repos";

/// An upstream repository the tools check out.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct RepositorySpec
{
    /// Label used in logs.
    pub name:        &'static str,
    /// Clone URL.
    pub url:         &'static str,
    /// Variable naming an existing checkout.
    pub env_var:     &'static str,
    /// Directory name under the repositories directory.
    pub default_dir: &'static str,
}

impl RepositorySpec
{
    /// Collector core repository.
    pub const CORE: Self = Self {
        name:        "core",
        url:         "https://github.com/open-telemetry/opentelemetry-collector.git",
        env_var:     "OTEL_COLLECTOR_CORE_PATH",
        default_dir: "opentelemetry-collector-core",
    };
    /// Collector contrib repository.
    pub const CONTRIB: Self = Self {
        name:        "contrib",
        url:         "https://github.com/open-telemetry/opentelemetry-collector-contrib.git",
        env_var:     "OTEL_COLLECTOR_CONTRIB_PATH",
        default_dir: "opentelemetry-collector-contrib",
    };
    /// opentelemetry.io documentation repository.
    pub const DOCS: Self = Self {
        name:        "opentelemetry.io",
        url:         "https://github.com/open-telemetry/opentelemetry.io.git",
        env_var:     "OTEL_DOCS_REPO_PATH",
        default_dir: "opentelemetry.io",
    };

    /// Repository of a collector distribution.
    pub const fn for_distribution(distribution: Distribution,) -> Self
    {
        match distribution {
            Distribution::Core => Self::CORE,
            Distribution::Contrib => Self::CONTRIB,
        }
    }
}

/// Resolves and prepares checkouts.
#[derive(Debug, Clone,)]
pub struct RepositoryManager
{
    base_dir:  PathBuf,
    overrides: BTreeMap<&'static str, PathBuf,>,
}

impl RepositoryManager
{
    /// Manager cloning under `base_dir` with no overrides.
    pub fn new(base_dir: impl Into<PathBuf,>,) -> Self
    {
        Self {
            base_dir:  base_dir.into(),
            overrides: BTreeMap::new(),
        }
    }

    /// Manager reading override variables from the process environment.
    pub fn from_env(base_dir: impl Into<PathBuf,>,) -> Self
    {
        [RepositorySpec::CORE, RepositorySpec::CONTRIB, RepositorySpec::DOCS,].into_iter().fold(
            Self::new(base_dir,),
            |manager, spec| match env::var_os(spec.env_var,) {
                Some(path,) if !path.is_empty() => manager.with_override(spec, path,),
                _ => manager,
            },
        )
    }

    /// Uses `path` for `spec` when it exists.
    #[must_use]
    pub fn with_override(mut self, spec: RepositorySpec, path: impl Into<PathBuf,>,) -> Self
    {
        self.overrides.insert(spec.env_var, path.into(),);
        self
    }

    /// Directory receiving clones.
    pub fn base_dir(&self,) -> &Path
    {
        &self.base_dir
    }

    /// Override checkout for `spec`, if configured and present on disk.
    pub fn override_path(&self, spec: RepositorySpec,) -> Option<&Path,>
    {
        let path = self.overrides.get(spec.env_var,)?;
        if path.exists() {
            info!("Using {} repository from {}: {}", spec.name, spec.env_var, path.display());
            Some(path,)
        } else {
            warn!("{} points to non-existent path: {}", spec.env_var, path.display());
            None
        }
    }

    /// Checkout directory used for `spec` when no override applies.
    pub fn default_path(&self, spec: RepositorySpec,) -> PathBuf
    {
        self.base_dir.join(spec.default_dir,)
    }

    /// Prepares the checkout of `spec`.
    ///
    /// An override checkout is used as is. Otherwise the repository is
    /// cloned when missing. With `update` the main branch is pulled, and a
    /// given `version` is checked out after fetching tags.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when a git operation fails.
    pub fn setup(&self, spec: RepositorySpec, version: Option<&Version,>, update: bool,) -> Result<GitRepository, Error,>
    {
        let (repository, cloned,) = match self.override_path(spec,) {
            Some(path,) => (GitRepository::open(path,)?, false,),
            None => {
                let path = self.default_path(spec,);
                if path.exists() {
                    (GitRepository::open(path,)?, false,)
                } else {
                    (GitRepository::clone_from(spec.url, &path,)?, true,)
                }
            }
        };

        match version {
            Some(version,) => {
                repository.fetch_tags()?;
                repository.checkout_tag(version,)?;
            }
            None if update && !cloned => {
                info!("Updating {} repository at {}", spec.name, repository.path().display());
                repository.pull_latest()?;
            }
            None => {}
        }
        Ok(repository,)
    }
}

#[cfg(test)]
mod tests
{
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn specs_cover_distributions()
    {
        assert_eq!(RepositorySpec::for_distribution(Distribution::Core,), RepositorySpec::CORE);
        assert_eq!(RepositorySpec::for_distribution(Distribution::Contrib,).env_var, "OTEL_COLLECTOR_CONTRIB_PATH");
        assert!(RepositorySpec::DOCS.url.ends_with("opentelemetry.io.git"));
    }

    #[test]
    fn existing_override_wins()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let manager = RepositoryManager::new(dir.path().join("repos",),).with_override(RepositorySpec::CORE, dir.path(),);

        assert_eq!(manager.override_path(RepositorySpec::CORE,), Some(dir.path()));
        assert_eq!(manager.override_path(RepositorySpec::CONTRIB,), None);
    }

    #[test]
    fn missing_override_falls_back_to_default_dir()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let manager =
            RepositoryManager::new(dir.path(),).with_override(RepositorySpec::DOCS, dir.path().join("nowhere",),);

        assert_eq!(manager.override_path(RepositorySpec::DOCS,), None);
        assert_eq!(manager.default_path(RepositorySpec::DOCS,), dir.path().join("opentelemetry.io"));
    }

    #[test]
    fn setup_uses_existing_checkout_without_update()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let checkout = dir.path().join("opentelemetry-collector-contrib",);
        std::fs::create_dir_all(&checkout,).expect("failed to create checkout",);

        let repository =
            RepositoryManager::new(dir.path(),).setup(RepositorySpec::CONTRIB, None, false,).expect("setup failed",);
        assert_eq!(repository.path(), checkout);
    }
}
