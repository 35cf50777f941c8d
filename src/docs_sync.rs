// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Regenerates the component tables of the collector documentation.
//!
//! The newest release of each distribution is loaded from the inventory,
//! merged, checked for metadata gaps and rendered into the marker sections
//! of `<components>/<page>.md`.

use std::{collections::BTreeMap, path::Path};

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    component::{ComponentType, Distribution},
    content::DocContentGenerator,
    diagnostics::MetadataDiagnostics,
    error::{self, Error},
    inventory::InventoryManager,
    markers::DocMarkerUpdater,
    merge::{MergedInventory, merge_inventories},
    version::Version,
};

/// Outcome of one table update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize,)]
#[serde(rename_all = "snake_case")]
pub enum PageOutcome
{
    /// The marker section was rewritten (or already up to date).
    Updated,
    /// The page file does not exist.
    MissingPage,
    /// The page exists but has no marker for the table.
    MissingMarker,
}

/// Result of a table update for one page and marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct PageUpdate
{
    /// Table key, such as `receiver` or `extension-encoding`.
    pub table:   String,
    /// Page file name under the components directory.
    pub page:    String,
    /// Marker id the table was written between.
    pub marker:  String,
    /// What happened to the page.
    pub outcome: PageOutcome,
}

/// Everything a docs sync run did.
#[derive(Debug, Clone, Default, Serialize,)]
pub struct DocsSyncReport
{
    /// Release used per distribution.
    pub versions:    BTreeMap<Distribution, Version,>,
    /// Components after merging.
    pub components:  usize,
    /// Per-table outcomes in table order.
    pub pages:       Vec<PageUpdate,>,
    /// Metadata gaps found in the merged inventory.
    pub diagnostics: MetadataDiagnostics,
}

impl DocsSyncReport
{
    /// Number of tables written.
    pub fn updated_count(&self,) -> usize
    {
        self.pages.iter().filter(|page| page.outcome == PageOutcome::Updated,).count()
    }
}

/// Newest tracked release of `distribution`.
///
/// # Errors
///
/// Returns [`Error::Validation`] when no version or only snapshots are
/// tracked.
pub fn latest_release_version(inventory: &InventoryManager, distribution: Distribution,) -> Result<Version, Error,>
{
    let versions = inventory.list_versions(distribution,)?;
    if versions.is_empty() {
        return Err(Error::validation(format!("no versions found for {distribution} distribution in inventory"),),);
    }
    versions
        .into_iter()
        .find(|version| !version.is_prerelease,)
        .ok_or_else(|| Error::validation(format!("no release versions found for {distribution} distribution in inventory"),),)
}

/// Page and marker receiving the table `key`.
///
/// Extension subtype tables (`extension-storage`, ...) live on the
/// extension page.
pub fn page_and_marker(key: &str,) -> (&str, String,)
{
    let page = if key.starts_with("extension-",) { ComponentType::Extension.as_str() } else { key };
    (page, format!("{key}-table"),)
}

/// Writes every table into its page under `components_dir`.
///
/// # Errors
///
/// Returns [`Error`] when an existing page cannot be read or written.
pub fn update_component_pages(
    components_dir: &Path,
    tables: &BTreeMap<String, String,>,
    updater: &DocMarkerUpdater,
) -> Result<Vec<PageUpdate,>, Error,>
{
    let mut updates = Vec::with_capacity(tables.len(),);
    for (key, table,) in tables {
        let (page, marker,) = page_and_marker(key,);
        let path = components_dir.join(format!("{page}.md"),);

        let outcome = if !path.is_file() {
            warn!("{page}.md not found, skipping");
            PageOutcome::MissingPage
        } else if updater.update_file(&path, &marker, table,)? {
            info!("Updated {page}.md ({marker})");
            PageOutcome::Updated
        } else {
            warn!("{page}.md has no marker '{marker}'");
            PageOutcome::MissingMarker
        };

        updates.push(PageUpdate {
            table: key.clone(),
            page: page.to_string(),
            marker,
            outcome,
        },);
    }
    Ok(updates,)
}

/// Loads, merges and diagnoses the newest core and contrib releases.
///
/// # Errors
///
/// Returns [`Error`] when a distribution has no release or an inventory
/// file cannot be read.
pub fn load_merged_inventory(
    inventory: &InventoryManager,
) -> Result<(BTreeMap<Distribution, Version,>, MergedInventory,), Error,>
{
    let mut versions = BTreeMap::new();
    for distribution in Distribution::ALL {
        let version = latest_release_version(inventory, distribution,)?;
        info!("{distribution} target version: {version}");
        versions.insert(distribution, version,);
    }

    let load = |distribution: Distribution| -> Result<_, Error,> {
        let version = versions
            .get(&distribution,)
            .ok_or_else(|| Error::validation(format!("no version selected for {distribution}"),),)?;
        Ok(inventory.load(distribution, version,)?.components,)
    };
    let merged = merge_inventories(&load(Distribution::Core,)?, &load(Distribution::Contrib,)?,);
    Ok((versions, merged,),)
}

/// Regenerates every component table in the documentation checkout.
///
/// # Errors
///
/// Returns [`Error::Io`] when `components_dir` does not exist, and the
/// errors of [`load_merged_inventory`] and [`update_component_pages`].
pub fn run_docs_sync(
    inventory: &InventoryManager,
    components_dir: &Path,
    updater: &DocMarkerUpdater,
) -> Result<DocsSyncReport, Error,>
{
    if !components_dir.is_dir() {
        return Err(error::io_error(
            components_dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "collector components directory does not exist",),
        ),);
    }

    let (versions, merged,) = load_merged_inventory(inventory,)?;
    let components = merged.components.values().map(Vec::len,).sum();
    info!("Loaded {components} total components");

    let diagnostics = MetadataDiagnostics::inspect(&merged,);
    if diagnostics.has_issues() {
        warn!("{}", diagnostics.summary());
    }

    let tables = DocContentGenerator.generate_all_tables(&merged,);
    info!("Generated {} component tables", tables.len());

    let pages = update_component_pages(components_dir, &tables, updater,)?;
    let report = DocsSyncReport {
        versions,
        components,
        pages,
        diagnostics,
    };
    if report.updated_count() == 0 {
        warn!("No pages were updated; pages need <!-- BEGIN GENERATED: <type>-table --> markers");
    } else {
        info!("Updated {} table(s)", report.updated_count());
    }
    Ok(report,)
}
