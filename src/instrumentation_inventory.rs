// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Versioned Java agent instrumentation inventory.
//!
//! Layout: `<root>/v<version>/instrumentation.yaml`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::{
    error::{self, Error},
    inventory::{list_version_dirs, remove_version_dir},
    version::Version,
};

/// Default inventory root relative to the working directory.
pub const DEFAULT_JAVAAGENT_INVENTORY: &str = "ecosystem-registry/java/javaagent";
/// Repository label written when the caller does not supply one.
pub const DEFAULT_JAVAAGENT_REPOSITORY: &str = "opentelemetry-java-instrumentation";
/// File holding one version's instrumentation list.
pub const INSTRUMENTATION_FILE_NAME: &str = "instrumentation.yaml";

/// Stateless manager over the Java agent inventory root.
#[derive(Debug, Clone,)]
pub struct InstrumentationInventory
{
    root: PathBuf,
}

impl InstrumentationInventory
{
    /// Creates a manager for `root`.
    pub fn new(root: impl Into<PathBuf,>,) -> Self
    {
        Self {
            root: root.into(),
        }
    }

    /// Inventory root.
    pub fn root(&self,) -> &Path
    {
        &self.root
    }

    /// `<root>/v<version>`.
    pub fn version_dir(&self, version: &Version,) -> PathBuf
    {
        self.root.join(version.to_string(),)
    }

    fn file_path(&self, version: &Version,) -> PathBuf
    {
        self.version_dir(version,).join(INSTRUMENTATION_FILE_NAME,)
    }

    /// Writes `{version, repository, ...document}` for `version`.
    ///
    /// `version` and `repository` always come from the arguments; the same
    /// keys inside `document` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Yaml`] on write failures.
    pub fn save(&self, version: &Version, document: &Mapping, repository: &str,) -> Result<(), Error,>
    {
        let dir = self.version_dir(version,);
        fs::create_dir_all(&dir,).map_err(|source| error::io_error(&dir, source,),)?;

        let mut stored = Mapping::new();
        stored.insert(Value::from("version",), Value::from(version.number(),),);
        stored.insert(Value::from("repository",), Value::from(repository,),);
        for (key, value,) in document {
            if matches!(key.as_str(), Some("version" | "repository")) {
                continue;
            }
            stored.insert(key.clone(), value.clone(),);
        }

        let path = self.file_path(version,);
        let yaml = serde_yaml::to_string(&stored,)?;
        fs::write(&path, yaml,).map_err(|source| error::io_error(&path, source,),)?;
        info!("Saved instrumentation inventory {} to {}", version, path.display());
        Ok((),)
    }

    /// Loads a version, returning `{version, repository, instrumentations: []}`
    /// when the file is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Yaml`] when an existing file cannot be
    /// read or decoded, and [`Error::Validation`] when it is not a mapping.
    pub fn load(&self, version: &Version,) -> Result<Mapping, Error,>
    {
        let path = self.file_path(version,);
        if !path.is_file() {
            debug!("No instrumentation inventory at {}", path.display());
            let mut skeleton = Mapping::new();
            skeleton.insert(Value::from("version",), Value::from(version.number(),),);
            skeleton.insert(Value::from("repository",), Value::from(DEFAULT_JAVAAGENT_REPOSITORY,),);
            skeleton.insert(Value::from("instrumentations",), Value::Sequence(Vec::new(),),);
            return Ok(skeleton,);
        }

        let content = fs::read_to_string(&path,).map_err(|source| error::io_error(&path, source,),)?;
        match serde_yaml::from_str::<Value,>(&content,)? {
            Value::Mapping(mapping,) => Ok(mapping,),
            Value::Null => Ok(Mapping::new(),),
            _ => Err(Error::validation(format!("{} is not a mapping", path.display()),),),
        }
    }

    /// Tracked versions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the root cannot be listed.
    pub fn list_versions(&self,) -> Result<Vec<Version,>, Error,>
    {
        list_version_dirs(&self.root,)
    }

    /// Tracked snapshot versions, newest first.
    ///
    /// # Errors
    ///
    /// See [`Self::list_versions`].
    pub fn list_snapshot_versions(&self,) -> Result<Vec<Version,>, Error,>
    {
        Ok(self.list_versions()?.into_iter().filter(|version| version.is_prerelease,).collect(),)
    }

    /// Deletes every snapshot and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when a directory cannot be removed.
    pub fn cleanup_snapshots(&self,) -> Result<usize, Error,>
    {
        let mut removed = 0;
        for snapshot in self.list_snapshot_versions()? {
            if remove_version_dir(&self.version_dir(&snapshot,),)? {
                removed += 1;
            }
        }
        Ok(removed,)
    }

    /// Returns true when the version's instrumentation file exists.
    pub fn version_exists(&self, version: &Version,) -> bool
    {
        self.file_path(version,).is_file()
    }
}
