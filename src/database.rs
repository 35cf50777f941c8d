// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Content-addressed JSON store consumed by the ecosystem explorer.
//!
//! Layout under the root:
//! - `instrumentations/<name>/<name>-<hash>.json` (write-once)
//! - `versions/<version>-index.json`
//! - `versions-index.json`

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_yaml::Value;
use tracing::{debug, error, info, warn};

use crate::{
    error::{self, Error},
    hashing::{content_hash, normalize},
    version::Version,
};

/// Default database root relative to the working directory.
pub const DEFAULT_DATABASE_DIR: &str = "ecosystem-explorer/public/data/javaagent";

/// Counters accumulated by one writer instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize,)]
pub struct DatabaseStats
{
    /// Files actually written (skipped write-once files excluded).
    pub files_written: usize,
    /// Bytes of the written files.
    pub total_bytes:   u64,
}

impl DatabaseStats
{
    /// Total size in mebibytes, for log output.
    pub fn total_mib(&self,) -> f64
    {
        self.total_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Serialize,)]
struct VersionIndex<'a,>
{
    instrumentations: &'a BTreeMap<String, String,>,
    version:          String,
}

#[derive(Serialize,)]
struct VersionList
{
    versions: Vec<VersionListEntry,>,
}

#[derive(Serialize,)]
struct VersionListEntry
{
    is_latest: bool,
    version:   String,
}

/// Writes libraries and indexes below a root directory.
#[derive(Debug,)]
pub struct DatabaseWriter
{
    root:  PathBuf,
    stats: DatabaseStats,
}

impl DatabaseWriter
{
    /// Creates a writer for `root` with zeroed counters.
    pub fn new(root: impl Into<PathBuf,>,) -> Self
    {
        Self {
            root: root.into(), stats: DatabaseStats::default(),
        }
    }

    /// Database root.
    pub fn root(&self,) -> &Path
    {
        &self.root
    }

    /// Counters accumulated so far.
    pub fn stats(&self,) -> DatabaseStats
    {
        self.stats
    }

    /// Hashes and stores every library, returning `name -> hash`.
    ///
    /// Entries that are not mappings or carry no usable `name` are skipped
    /// with a warning. A file that already exists for a `(name, hash)` pair is
    /// left untouched and not counted, but its hash is still recorded. Hashing
    /// or write failures drop only the affected entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when `libraries` is empty or no entry
    /// could be processed.
    pub fn write_libraries(&mut self, libraries: &[Value],) -> Result<BTreeMap<String, String,>, Error,>
    {
        if libraries.is_empty() {
            return Err(Error::validation("libraries list cannot be empty",),);
        }

        let mut library_map = BTreeMap::new();
        for (index, library,) in libraries.iter().enumerate() {
            let Some(entry,) = library.as_mapping() else {
                warn!("Skipping library at index {}: not a mapping", index);
                continue;
            };
            let Some(name,) = entry.get("name",).and_then(Value::as_str,) else {
                warn!("Skipping library at index {}: missing 'name' field", index);
                continue;
            };
            if !is_safe_file_stem(name,) {
                warn!("Skipping library at index {}: unusable name {:?}", index, name);
                continue;
            }

            match self.write_library(name, library,) {
                Ok(hash,) => {
                    library_map.insert(name.to_string(), hash,);
                }
                Err(err,) => error!("Failed to store library '{}': {}", name, err),
            }
        }

        if library_map.is_empty() {
            return Err(Error::validation("no valid libraries were processed",),);
        }
        Ok(library_map,)
    }

    fn write_library(&mut self, name: &str, library: &Value,) -> Result<String, Error,>
    {
        let hash = content_hash(library,)?;
        let dir = self.root.join("instrumentations",).join(name,);
        fs::create_dir_all(&dir,).map_err(|source| error::io_error(&dir, source,),)?;

        let path = dir.join(format!("{name}-{hash}.json"),);
        if path.exists() {
            debug!("Library '{}' with hash {} already stored", name, hash);
            return Ok(hash,);
        }

        self.write_json(&path, &normalize(library,)?,)?;
        debug!("Wrote library '{}' with hash {}", name, hash);
        Ok(hash,)
    }

    /// Writes `versions/<version>-index.json`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty map and [`Error::Io`] on
    /// write failures.
    pub fn write_version_index(
        &mut self,
        version: &Version,
        library_map: &BTreeMap<String, String,>,
    ) -> Result<(), Error,>
    {
        if library_map.is_empty() {
            return Err(Error::validation("library map cannot be empty",),);
        }
        let dir = self.root.join("versions",);
        fs::create_dir_all(&dir,).map_err(|source| error::io_error(&dir, source,),)?;

        let path = dir.join(format!("{}-index.json", version.number()),);
        self.write_json(
            &path,
            &VersionIndex {
                instrumentations: library_map,
                version:          version.number(),
            },
        )?;
        info!("Wrote version index for {} with {} instrumentations", version, library_map.len());
        Ok((),)
    }

    /// Writes `versions-index.json`; the first version is marked latest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty list and [`Error::Io`] on
    /// write failures.
    pub fn write_version_list(&mut self, versions: &[Version],) -> Result<(), Error,>
    {
        let Some(latest,) = versions.first() else {
            return Err(Error::validation("versions list cannot be empty",),);
        };
        fs::create_dir_all(&self.root,).map_err(|source| error::io_error(&self.root, source,),)?;

        let list = VersionList {
            versions: versions
                .iter()
                .enumerate()
                .map(|(index, version,)| VersionListEntry {
                    is_latest: index == 0,
                    version:   version.number(),
                },)
                .collect(),
        };
        let path = self.root.join("versions-index.json",);
        self.write_json(&path, &list,)?;
        info!("Wrote version list with {} versions (latest: {})", versions.len(), latest);
        Ok((),)
    }

    /// Removes the root with everything below it and recreates it empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when removal or creation fails.
    pub fn clean(&self,) -> Result<(), Error,>
    {
        if self.root.exists() {
            info!("Cleaning database directory {}", self.root.display());
            fs::remove_dir_all(&self.root,).map_err(|source| error::io_error(&self.root, source,),)?;
        }
        fs::create_dir_all(&self.root,).map_err(|source| error::io_error(&self.root, source,),)
    }

    fn write_json<T,>(&mut self, path: &Path, value: &T,) -> Result<(), Error,>
    where
        T: Serialize,
    {
        let content = serde_json::to_string_pretty(value,)?;
        let file = File::create(path,).map_err(|source| error::io_error(path, source,),)?;
        let mut writer = BufWriter::new(file,);
        writer.write_all(content.as_bytes(),).map_err(|source| error::io_error(path, source,),)?;
        writer.flush().map_err(|source| error::io_error(path, source,),)?;

        self.stats.files_written += 1;
        self.stats.total_bytes += content.len() as u64;
        Ok((),)
    }
}

fn is_safe_file_stem(name: &str,) -> bool
{
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\',],)
}
