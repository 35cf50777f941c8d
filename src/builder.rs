// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Builds the explorer database from the Java agent inventory.
//!
//! Every tracked release is written as content-addressed library files plus
//! a per-version index, followed by the master version list.

use indicatif::{ProgressBar, ProgressStyle};
use serde_yaml::Value;
use tracing::info;

use crate::{
    database::{DatabaseStats, DatabaseWriter},
    error::Error,
    instrumentation_inventory::InstrumentationInventory,
    version::Version,
};

const LIBRARIES_KEY: &str = "libraries";

/// Tracked release versions, newest first.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the inventory is empty or holds only
/// snapshots.
pub fn release_versions(inventory: &InstrumentationInventory,) -> Result<Vec<Version,>, Error,>
{
    let versions = inventory.list_versions()?;
    if versions.is_empty() {
        return Err(Error::validation("no versions found in inventory",),);
    }

    let releases: Vec<Version,> = versions.into_iter().filter(|version| !version.is_prerelease,).collect();
    if releases.is_empty() {
        return Err(Error::validation("no release versions found in inventory (only prereleases)",),);
    }
    Ok(releases,)
}

/// Writes the libraries and the index of one version.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the stored document has no
/// `libraries` list or an empty one, and propagates writer failures.
pub fn process_version(
    version: &Version,
    inventory: &InstrumentationInventory,
    writer: &mut DatabaseWriter,
) -> Result<(), Error,>
{
    info!("Processing Java agent version {version}");
    let document = inventory.load(version,)?;
    let libraries = match document.get(LIBRARIES_KEY,) {
        Some(Value::Sequence(libraries,),) => libraries,
        Some(_,) => return Err(Error::validation(format!("inventory for version {version} has malformed 'libraries'"),),),
        None => return Err(Error::validation(format!("inventory for version {version} missing 'libraries' key"),),),
    };
    if libraries.is_empty() {
        return Err(Error::validation(format!("no libraries found in inventory for version {version}"),),);
    }

    info!("Found {} libraries", libraries.len());
    let library_map = writer.write_libraries(libraries,)?;
    writer.write_version_index(version, &library_map,)
}

/// Rebuilds the database, optionally wiping it first, and returns the
/// writer statistics.
///
/// # Errors
///
/// Stops at the first failing version.
pub fn run_builder(
    inventory: &InstrumentationInventory,
    writer: &mut DatabaseWriter,
    clean: bool,
) -> Result<DatabaseStats, Error,>
{
    if clean {
        writer.clean()?;
    }

    let versions = release_versions(inventory,)?;
    info!("Processing {} release versions", versions.len());

    let pb = ProgressBar::new(versions.len() as u64,);
    if let Ok(style,) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}",) {
        pb.set_style(style,);
    }
    for version in &versions {
        pb.set_message(version.to_string(),);
        process_version(version, inventory, writer,)?;
        pb.inc(1,);
    }
    pb.finish_and_clear();

    writer.write_version_list(&versions,)?;

    let stats = writer.stats();
    info!("Files written: {}", stats.files_written);
    info!("Total size: {} bytes ({:.2} MiB)", stats.total_bytes, stats.total_mib());
    Ok(stats,)
}
