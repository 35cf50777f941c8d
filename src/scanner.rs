// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Discovers collector components by walking a repository checkout.
//!
//! Layout is at most `category/[subtype/]component`. A directory counts as a
//! component when its name passes the naming rules and it directly contains
//! `go.mod` or a `*.go` file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    component::{ComponentRecord, ComponentType, ComponentsByType, ExtensionSubtype},
    error::{self, Error},
    metadata::MetadataParser,
};

/// Support packages living next to real components.
const EXCLUDED_DIRECTORIES: [&str; 4] =
    ["extensionauth", "extensioncapabilities", "extensionmiddleware", "opampcustommessages",];

/// Scans one repository checkout.
#[derive(Debug, Clone,)]
pub struct ComponentScanner
{
    repo_root: PathBuf,
}

impl ComponentScanner
{
    /// Creates a scanner rooted at `repo_root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] with [`std::io::ErrorKind::NotFound`] when the
    /// root does not exist.
    pub fn new(repo_root: impl Into<PathBuf,>,) -> Result<Self, Error,>
    {
        let repo_root = repo_root.into();
        if !repo_root.exists() {
            return Err(error::io_error(
                &repo_root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "repository path does not exist",),
            ),);
        }
        Ok(Self {
            repo_root,
        },)
    }

    /// Repository root being scanned.
    pub fn repo_root(&self,) -> &Path
    {
        &self.repo_root
    }

    /// Scans every category. Each category maps to a (possibly empty) list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when a category directory cannot be listed.
    pub fn scan_all(&self,) -> Result<ComponentsByType, Error,>
    {
        let mut components = ComponentsByType::new();
        for kind in ComponentType::ALL {
            components.insert(kind, self.scan_type(kind,)?,);
        }
        info!(
            "Scanned {} components in {}",
            components.values().map(Vec::len,).sum::<usize>(),
            self.repo_root.display()
        );
        Ok(components,)
    }

    /// Scans a single category in sorted directory order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when a directory cannot be listed.
    pub fn scan_type(&self, kind: ComponentType,) -> Result<Vec<ComponentRecord,>, Error,>
    {
        let category_dir = self.repo_root.join(kind.as_str(),);
        if !category_dir.is_dir() {
            debug!("No {} directory in {}", kind, self.repo_root.display());
            return Ok(Vec::new(),);
        }

        let mut records = Vec::new();
        for entry in sorted_subdirectories(&category_dir,)? {
            let Some(name,) = dir_name(&entry,) else {
                continue;
            };
            if kind == ComponentType::Extension
                && let Some(subtype,) = ExtensionSubtype::from_dir_name(&name,)
            {
                records.extend(scan_nested(&entry, subtype,)?,);
                continue;
            }
            if is_component_directory(&entry, &name,) {
                records.push(component_record(&entry, name, None,),);
            }
        }
        Ok(records,)
    }
}

fn scan_nested(group_dir: &Path, subtype: ExtensionSubtype,) -> Result<Vec<ComponentRecord,>, Error,>
{
    let mut records = Vec::new();
    for entry in sorted_subdirectories(group_dir,)? {
        if let Some(name,) = dir_name(&entry,)
            && is_component_directory(&entry, &name,)
        {
            records.push(component_record(&entry, name, Some(subtype,),),);
        }
    }
    Ok(records,)
}

fn is_component_directory(dir: &Path, name: &str,) -> bool
{
    is_valid_component_name(name,) && !EXCLUDED_DIRECTORIES.contains(&name,) && has_go_code(dir,)
}

fn component_record(dir: &Path, name: String, subtype: Option<ExtensionSubtype,>,) -> ComponentRecord
{
    let metadata = MetadataParser::new(dir,).parse();
    if metadata.is_none() {
        debug!("Component {} has no usable metadata", dir.display());
    }
    ComponentRecord::new(name, subtype, metadata,)
}

/// Hidden, private, internal, test and helper directories are not components.
pub fn is_valid_component_name(name: &str,) -> bool
{
    !(name.starts_with('.',)
        || name.starts_with('_',)
        || name == "internal"
        || name == "testdata"
        || name.ends_with("test",)
        || name.ends_with("helper",))
}

fn has_go_code(dir: &Path,) -> bool
{
    if dir.join("go.mod",).is_file() {
        return true;
    }
    fs::read_dir(dir,).is_ok_and(|entries| {
        entries.flatten().any(|entry| {
            entry.path().extension().is_some_and(|ext| ext == "go",)
                && entry.file_type().is_ok_and(|kind| kind.is_file(),)
        },)
    },)
}

fn sorted_subdirectories(dir: &Path,) -> Result<Vec<PathBuf,>, Error,>
{
    let entries = fs::read_dir(dir,).map_err(|source| error::io_error(dir, source,),)?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| error::io_error(dir, source,),)?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path,);
        }
    }
    dirs.sort();
    Ok(dirs,)
}

fn dir_name(path: &Path,) -> Option<String,>
{
    path.file_name().and_then(|name| name.to_str(),).map(str::to_string,)
}
