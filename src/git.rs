// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Git operations over local collector checkouts.
//!
//! Lists release tags, checks out releases or `main`, and keeps clones up to
//! date. Git runs as a subprocess.

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{debug, info};

use crate::{
    error::{Error, io_error},
    version::Version,
};

/// Branch holding unreleased work.
pub const MAIN_BRANCH: &str = "main";

/// Releases of one upstream repository and the ability to check them out.
pub trait ReleaseSource
{
    /// Release versions, newest first, snapshots excluded.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when the releases cannot be listed.
    fn release_tags(&self,) -> Result<Vec<Version,>, Error,>;

    /// Checks out `version`, or the main branch for a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when the checkout fails.
    fn checkout(&self, version: &Version,) -> Result<(), Error,>;

    /// Newest release, if any.
    ///
    /// # Errors
    ///
    /// Propagates [`ReleaseSource::release_tags`] failures.
    fn latest_release(&self,) -> Result<Option<Version,>, Error,>
    {
        Ok(self.release_tags()?.into_iter().next(),)
    }

    /// Snapshot following the newest release, `v0.0.1-SNAPSHOT` without one.
    ///
    /// # Errors
    ///
    /// Propagates [`ReleaseSource::release_tags`] failures.
    fn next_snapshot_version(&self,) -> Result<Version, Error,>
    {
        let next = match self.latest_release()? {
            Some(latest,) => latest.next_patch()?,
            None => Version::new(0, 0, 1,),
        };
        Ok(next.as_snapshot(),)
    }
}

/// A local git checkout.
#[derive(Debug, Clone,)]
pub struct GitRepository
{
    path: PathBuf,
}

impl GitRepository
{
    /// Opens the checkout at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the path does not exist.
    pub fn open(path: impl Into<PathBuf,>,) -> Result<Self, Error,>
    {
        let path = path.into();
        if !path.exists() {
            return Err(Error::validation(format!("repository path does not exist: {}", path.display()),),);
        }
        Ok(Self {
            path,
        },)
    }

    /// Clones `url` into `target`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the parent cannot be created and
    /// [`Error::Command`] when the clone fails.
    pub fn clone_from(url: &str, target: &Path,) -> Result<Self, Error,>
    {
        if let Some(parent,) = target.parent() {
            fs::create_dir_all(parent,).map_err(|e| io_error(parent, e,),)?;
        }
        info!("Cloning {url} into {}", target.display());
        let target_arg = target.to_string_lossy();
        run_git(None, &["clone", url, &target_arg],)?;
        Self::open(target,)
    }

    /// Checkout directory.
    pub fn path(&self,) -> &Path
    {
        &self.path
    }

    /// Fetches all tags from `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Command`] when git fails.
    pub fn fetch_tags(&self,) -> Result<(), Error,>
    {
        run_git(Some(&self.path,), &["fetch", "--tags"],).map(drop,)
    }

    /// Checks out `main` and pulls it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Command`] when git fails.
    pub fn pull_latest(&self,) -> Result<(), Error,>
    {
        self.checkout_main()?;
        run_git(Some(&self.path,), &["pull"],)?;
        info!("Pulled latest changes at {}", self.path.display());
        Ok((),)
    }

    /// Checks out the main branch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Command`] when git fails.
    pub fn checkout_main(&self,) -> Result<(), Error,>
    {
        run_git(Some(&self.path,), &["checkout", MAIN_BRANCH],).map(drop,)
    }

    /// Checks out the release tag `v<version>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Command`] when the tag does not exist.
    pub fn checkout_tag(&self, version: &Version,) -> Result<(), Error,>
    {
        let tag = version.to_string();
        run_git(Some(&self.path,), &["checkout", &tag],)?;
        info!("Checked out {tag} at {}", self.path.display());
        Ok((),)
    }
}

impl ReleaseSource for GitRepository
{
    fn release_tags(&self,) -> Result<Vec<Version,>, Error,>
    {
        let output = run_git(Some(&self.path,), &["tag", "--list"],)?;
        Ok(release_versions_from_tags(output.lines(),),)
    }

    fn checkout(&self, version: &Version,) -> Result<(), Error,>
    {
        if version.is_prerelease { self.checkout_main() } else { self.checkout_tag(version,) }
    }
}

/// Parses tag names into release versions, newest first.
///
/// Unparseable and snapshot tags are ignored.
pub fn release_versions_from_tags<'a,>(tags: impl IntoIterator<Item = &'a str,>,) -> Vec<Version,>
{
    let mut versions: Vec<Version,> = tags
        .into_iter()
        .filter_map(|tag| Version::parse(tag.trim(),).ok(),)
        .filter(|version| !version.is_prerelease,)
        .collect();
    versions.sort_unstable_by(|left, right| right.cmp(left,),);
    versions.dedup();
    versions
}

/// Runs git, returning stdout.
fn run_git(dir: Option<&Path,>, args: &[&str],) -> Result<String, Error,>
{
    let mut command = Command::new("git",);
    if let Some(dir,) = dir {
        command.current_dir(dir,);
    }
    debug!("git {}", args.join(" "));
    let output =
        command.args(args,).output().map_err(|e| Error::command(format!("git {}", args.join(" ")), e.to_string(),),)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr,);
        return Err(Error::command(format!("git {}", args.join(" ")), stderr.trim().to_string(),),);
    }

    Ok(String::from_utf8_lossy(&output.stdout,).into_owned(),)
}
