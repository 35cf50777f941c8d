// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Versioned collector component inventory on the filesystem.
//!
//! Layout: `<root>/<distribution>/v<version>/<component_type>.yaml`. A version
//! is tracked exactly when its directory exists.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    component::{ComponentRecord, ComponentType, ComponentsByType, Distribution, empty_components},
    error::{self, Error},
    version::{Version, sort_newest_first},
};

/// Default inventory root relative to the working directory.
pub const DEFAULT_COLLECTOR_INVENTORY: &str = "ecosystem-registry/collector";

/// All components of one distribution at one version.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct Inventory
{
    /// Distribution the components belong to.
    pub distribution: Distribution,
    /// Scanned version.
    pub version:      Version,
    /// Repository label recorded at save time; empty for missing versions.
    pub repository:   String,
    /// Components per category.
    pub components:   ComponentsByType,
}

#[derive(Serialize,)]
struct InventoryFile<'a,>
{
    distribution:   Distribution,
    version:        Version,
    repository:     &'a str,
    component_type: ComponentType,
    components:     &'a [ComponentRecord],
}

#[derive(Deserialize,)]
struct StoredInventoryFile
{
    #[serde(default)]
    repository: String,
    #[serde(default)]
    components: Vec<ComponentRecord,>,
}

/// Stateless manager over an inventory root. Single writer per root.
#[derive(Debug, Clone,)]
pub struct InventoryManager
{
    root: PathBuf,
}

impl InventoryManager
{
    /// Creates a manager for `root`. Nothing is created until the first save.
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

    /// `<root>/<distribution>/v<version>`.
    pub fn version_dir(&self, distribution: Distribution, version: &Version,) -> PathBuf
    {
        self.root.join(distribution.as_str(),).join(version.to_string(),)
    }

    /// Writes one file per category, empty categories included, overwriting
    /// any previous content for the version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the directory or a file cannot be written
    /// and [`Error::Yaml`] when serialization fails.
    pub fn save(
        &self,
        distribution: Distribution,
        version: &Version,
        components: &ComponentsByType,
        repository: &str,
    ) -> Result<(), Error,>
    {
        let dir = self.version_dir(distribution, version,);
        fs::create_dir_all(&dir,).map_err(|source| error::io_error(&dir, source,),)?;

        for kind in ComponentType::ALL {
            let records = components.get(&kind,).map(Vec::as_slice,).unwrap_or_default();
            let document = InventoryFile {
                distribution,
                version: *version,
                repository,
                component_type: kind,
                components: records,
            };
            let path = dir.join(format!("{kind}.yaml"),);
            let yaml = serde_yaml::to_string(&document,)?;
            fs::write(&path, yaml,).map_err(|source| error::io_error(&path, source,),)?;
            debug!("Wrote {} {} components to {}", records.len(), kind, path.display());
        }

        info!("Saved {} inventory for {}", distribution, version);
        Ok((),)
    }

    /// Loads a version, returning an empty skeleton when it is not tracked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Yaml`] when an existing file cannot
    /// be read or decoded.
    pub fn load(&self, distribution: Distribution, version: &Version,) -> Result<Inventory, Error,>
    {
        let dir = self.version_dir(distribution, version,);
        let mut inventory = Inventory {
            distribution,
            version: *version,
            repository: String::new(),
            components: empty_components(),
        };
        if !dir.is_dir() {
            debug!("No inventory at {}", dir.display());
            return Ok(inventory,);
        }

        for kind in ComponentType::ALL {
            let path = dir.join(format!("{kind}.yaml"),);
            if !path.is_file() {
                continue;
            }
            let content = fs::read_to_string(&path,).map_err(|source| error::io_error(&path, source,),)?;
            let Some(stored,) = serde_yaml::from_str::<Option<StoredInventoryFile,>,>(&content,)? else {
                continue;
            };
            if inventory.repository.is_empty() {
                inventory.repository = stored.repository;
            }
            inventory.components.insert(kind, stored.components,);
        }
        Ok(inventory,)
    }

    /// Tracked versions, newest first. Directories whose names do not parse
    /// as versions are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the distribution directory cannot be listed.
    pub fn list_versions(&self, distribution: Distribution,) -> Result<Vec<Version,>, Error,>
    {
        list_version_dirs(&self.root.join(distribution.as_str(),),)
    }

    /// Tracked snapshot versions, newest first.
    ///
    /// # Errors
    ///
    /// See [`Self::list_versions`].
    pub fn list_snapshot_versions(&self, distribution: Distribution,) -> Result<Vec<Version,>, Error,>
    {
        Ok(self.list_versions(distribution,)?.into_iter().filter(|version| version.is_prerelease,).collect(),)
    }

    /// Deletes every snapshot version and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when a directory cannot be removed.
    pub fn cleanup_snapshots(&self, distribution: Distribution,) -> Result<usize, Error,>
    {
        let mut removed = 0;
        for snapshot in self.list_snapshot_versions(distribution,)? {
            if self.delete_version(distribution, &snapshot,)? {
                info!("Removed {} snapshot {}", distribution, snapshot);
                removed += 1;
            }
        }
        Ok(removed,)
    }

    /// Returns true when the version directory exists.
    pub fn version_exists(&self, distribution: Distribution, version: &Version,) -> bool
    {
        self.version_dir(distribution, version,).is_dir()
    }

    /// Deletes a version directory. Returns false when it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when removal fails.
    pub fn delete_version(&self, distribution: Distribution, version: &Version,) -> Result<bool, Error,>
    {
        remove_version_dir(&self.version_dir(distribution, version,),)
    }
}

/// Lists `v<version>` directories below `dir`, newest first.
pub(crate) fn list_version_dirs(dir: &Path,) -> Result<Vec<Version,>, Error,>
{
    if !dir.is_dir() {
        return Ok(Vec::new(),);
    }
    let mut versions = Vec::new();
    for entry in fs::read_dir(dir,).map_err(|source| error::io_error(dir, source,),)? {
        let entry = entry.map_err(|source| error::io_error(dir, source,),)?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name();
        match name.to_str().map(Version::parse,) {
            Some(Ok(version,),) => versions.push(version,),
            _ => warn!("Skipping non-version directory {}", entry.path().display()),
        }
    }
    sort_newest_first(&mut versions,);
    Ok(versions,)
}

pub(crate) fn remove_version_dir(dir: &Path,) -> Result<bool, Error,>
{
    if !dir.is_dir() {
        return Ok(false,);
    }
    fs::remove_dir_all(dir,).map_err(|source| error::io_error(dir, source,),)?;
    Ok(true,)
}

#[cfg(test)]
mod tests
{
    use tempfile::tempdir;

    use super::*;
    use crate::metadata::NormalizedMetadata;

    fn version(text: &str,) -> Version
    {
        Version::parse(text,).expect("valid version",)
    }

    fn sample_components() -> ComponentsByType
    {
        let mut components = empty_components();
        let metadata = NormalizedMetadata {
            component_type: Some("otlp".to_string(),),
            ..NormalizedMetadata::default()
        };
        components.insert(
            ComponentType::Receiver,
            vec![
                ComponentRecord::new("otlpreceiver", None, Some(metadata,),),
                ComponentRecord::new("nopreceiver", None, None,),
            ],
        );
        components
    }

    #[test]
    fn save_then_load_round_trips()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let manager = InventoryManager::new(dir.path(),);
        let version = version("v0.112.0",);
        let components = sample_components();

        manager
            .save(Distribution::Core, &version, &components, "opentelemetry-collector",)
            .expect("save succeeds",);
        assert!(manager.version_exists(Distribution::Core, &version));

        let loaded = manager.load(Distribution::Core, &version,).expect("load succeeds",);
        assert_eq!(loaded.components, components);
        assert_eq!(loaded.repository, "opentelemetry-collector");
    }

    #[test]
    fn save_writes_every_category_in_key_order()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let manager = InventoryManager::new(dir.path(),);
        let version = version("v0.112.0",);
        manager
            .save(Distribution::Contrib, &version, &sample_components(), "opentelemetry-collector-contrib",)
            .expect("save succeeds",);

        let version_dir = dir.path().join("contrib/v0.112.0",);
        for kind in ComponentType::ALL {
            assert!(version_dir.join(format!("{kind}.yaml")).is_file(), "{kind} file missing");
        }
        let exporter = fs::read_to_string(version_dir.join("exporter.yaml",),).expect("read exporter file",);
        assert_eq!(
            exporter,
            "distribution: contrib\nversion: 0.112.0\nrepository: opentelemetry-collector-contrib\n\
             component_type: exporter\ncomponents: []\n"
        );
    }

    #[test]
    fn load_of_untracked_version_is_empty_skeleton()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let manager = InventoryManager::new(dir.path(),);
        let loaded = manager.load(Distribution::Core, &version("v1.0.0",),).expect("load succeeds",);
        assert_eq!(loaded.components.len(), ComponentType::ALL.len());
        assert!(loaded.components.values().all(Vec::is_empty));
        assert!(loaded.repository.is_empty());
    }

    #[test]
    fn list_versions_sorts_and_skips_foreign_directories()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let manager = InventoryManager::new(dir.path(),);
        let empty = ComponentsByType::new();
        for text in ["v0.9.0", "v0.112.0", "v0.113.0-SNAPSHOT"] {
            manager.save(Distribution::Core, &version(text,), &empty, "repo",).expect("save succeeds",);
        }
        fs::create_dir_all(dir.path().join("core/not-a-version",),).expect("create foreign dir",);

        let versions = manager.list_versions(Distribution::Core,).expect("list succeeds",);
        let rendered: Vec<String,> = versions.iter().map(ToString::to_string,).collect();
        assert_eq!(rendered, ["v0.113.0-SNAPSHOT", "v0.112.0", "v0.9.0"]);
        assert!(manager.list_versions(Distribution::Contrib,).expect("list succeeds",).is_empty());
    }

    #[test]
    fn cleanup_removes_only_snapshots()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let manager = InventoryManager::new(dir.path(),);
        let empty = ComponentsByType::new();
        for text in ["v0.112.0", "v0.113.0-SNAPSHOT", "v0.114.0-SNAPSHOT"] {
            manager.save(Distribution::Core, &version(text,), &empty, "repo",).expect("save succeeds",);
        }

        assert_eq!(manager.cleanup_snapshots(Distribution::Core,).expect("cleanup succeeds",), 2);
        assert_eq!(manager.cleanup_snapshots(Distribution::Core,).expect("cleanup succeeds",), 0);
        assert!(manager.list_snapshot_versions(Distribution::Core,).expect("list succeeds",).is_empty());
        assert!(manager.version_exists(Distribution::Core, &version("v0.112.0",)));
    }

    #[test]
    fn delete_version_reports_presence()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let manager = InventoryManager::new(dir.path(),);
        let version = version("v0.112.0",);
        manager.save(Distribution::Core, &version, &ComponentsByType::new(), "repo",).expect("save succeeds",);

        assert!(manager.delete_version(Distribution::Core, &version,).expect("delete succeeds",));
        assert!(!manager.delete_version(Distribution::Core, &version,).expect("delete succeeds",));
        assert!(!manager.version_exists(Distribution::Core, &version));
    }

    #[test]
    fn version_exists_tracks_save_and_delete()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let manager = InventoryManager::new(dir.path(),);
        let version = version("v0.113.0",);
        assert!(!manager.version_exists(Distribution::Core, &version));

        manager.save(Distribution::Core, &version, &empty_components(), "repo",).expect("save succeeds",);
        assert!(manager.version_exists(Distribution::Core, &version));
        assert!(!manager.version_exists(Distribution::Contrib, &version));

        manager.delete_version(Distribution::Core, &version,).expect("delete succeeds",);
        assert!(!manager.version_exists(Distribution::Core, &version));
    }
}
