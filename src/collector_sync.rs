// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Keeps the collector inventory in step with upstream releases.
//!
//! For each configured distribution the latest release is scanned once and
//! the snapshot is rebuilt from `main` on every run.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::{
    component::{ComponentsByType, Distribution},
    error::Error,
    git::ReleaseSource,
    inventory::InventoryManager,
    scanner::ComponentScanner,
    version::Version,
};

/// A distribution version written during a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize,)]
pub struct SyncedVersion
{
    /// Distribution whose inventory was written.
    pub distribution: Distribution,
    /// Release or snapshot version of the written inventory.
    pub version:      Version,
}

/// What a sync run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize,)]
pub struct SyncSummary
{
    /// Releases scanned for the first time.
    pub new_releases:      Vec<SyncedVersion,>,
    /// Snapshot inventories rewritten from the main branch.
    pub snapshots_updated: Vec<SyncedVersion,>,
}

struct Checkout<S,>
{
    distribution: Distribution,
    source:       S,
    path:         PathBuf,
}

/// Scans collector checkouts into an [`InventoryManager`].
pub struct CollectorSync<S,>
{
    checkouts: Vec<Checkout<S,>,>,
    inventory: InventoryManager,
}

impl<S: ReleaseSource,> CollectorSync<S,>
{
    /// Sync writing into `inventory`, with no distributions yet.
    pub fn new(inventory: InventoryManager,) -> Self
    {
        Self {
            checkouts: Vec::new(),
            inventory,
        }
    }

    /// Adds a distribution whose releases come from `source` and whose
    /// working tree is at `path`.
    #[must_use]
    pub fn with_distribution(mut self, distribution: Distribution, source: S, path: impl Into<PathBuf,>,) -> Self
    {
        self.checkouts.push(Checkout {
            distribution,
            source,
            path: path.into(),
        },);
        self
    }

    /// Inventory written to.
    pub fn inventory(&self,) -> &InventoryManager
    {
        &self.inventory
    }

    /// Configured distributions in registration order.
    pub fn distributions(&self,) -> impl Iterator<Item = Distribution,> + '_
    {
        self.checkouts.iter().map(|checkout| checkout.distribution,)
    }

    fn checkout_for(&self, distribution: Distribution,) -> Result<&Checkout<S,>, Error,>
    {
        self.checkouts
            .iter()
            .find(|checkout| checkout.distribution == distribution,)
            .ok_or_else(|| Error::validation(format!("distribution {distribution} is not configured"),),)
    }

    /// Release source of `distribution`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the distribution is not configured.
    pub fn source(&self, distribution: Distribution,) -> Result<&S, Error,>
    {
        Ok(&self.checkout_for(distribution,)?.source,)
    }

    /// Scans `distribution` at `version`, checking it out first when
    /// `checkout` is set (`main` for snapshots).
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when the checkout or the scan fails.
    pub fn scan_version(
        &self,
        distribution: Distribution,
        version: &Version,
        checkout: bool,
    ) -> Result<ComponentsByType, Error,>
    {
        let target = self.checkout_for(distribution,)?;
        if checkout {
            info!("Checking out {distribution} {version}");
            target.source.checkout(version,)?;
        }

        info!("Scanning {distribution} {version}");
        let components = ComponentScanner::new(&target.path,)?.scan_all()?;
        info!("Found {} components", components.values().map(Vec::len,).sum::<usize>());
        Ok(components,)
    }

    /// Saves scanned components under the distribution's repository name.
    ///
    /// # Errors
    ///
    /// Propagates [`InventoryManager::save`] failures.
    pub fn save_version(
        &self,
        distribution: Distribution,
        version: &Version,
        components: &ComponentsByType,
    ) -> Result<(), Error,>
    {
        self.inventory.save(distribution, version, components, distribution.repository_name(),)
    }

    /// Scans and saves the latest release unless it is already tracked.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when listing, scanning or saving fails.
    pub fn process_latest_release(&self, distribution: Distribution,) -> Result<Option<Version,>, Error,>
    {
        let Some(latest,) = self.source(distribution,)?.latest_release()? else {
            info!("No releases found for {distribution}");
            return Ok(None,);
        };

        if self.inventory.version_exists(distribution, &latest,) {
            info!("Version {distribution} {latest} already tracked");
            return Ok(None,);
        }

        info!("Processing new release: {distribution} {latest}");
        let components = self.scan_version(distribution, &latest, true,)?;
        self.save_version(distribution, &latest, &components,)?;
        Ok(Some(latest,),)
    }

    /// Replaces the snapshot of `distribution` with a scan of `main`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when cleanup, scanning or saving fails.
    pub fn update_snapshot(&self, distribution: Distribution,) -> Result<Version, Error,>
    {
        let removed = self.inventory.cleanup_snapshots(distribution,)?;
        if removed > 0 {
            info!("Removed {removed} old {distribution} snapshot(s)");
        }

        let snapshot = self.source(distribution,)?.next_snapshot_version()?;
        info!("Updating {distribution} {snapshot}");
        let components = self.scan_version(distribution, &snapshot, true,)?;
        self.save_version(distribution, &snapshot, &components,)?;
        Ok(snapshot,)
    }

    /// Processes the latest release and refreshes the snapshot of every
    /// configured distribution.
    ///
    /// # Errors
    ///
    /// Stops at the first failing distribution.
    pub fn sync(&self,) -> Result<SyncSummary, Error,>
    {
        let mut summary = SyncSummary::default();
        for distribution in self.distributions() {
            info!("Distribution: {distribution}");
            if let Some(version,) = self.process_latest_release(distribution,)? {
                summary.new_releases.push(SyncedVersion {
                    distribution,
                    version,
                },);
            }
            let version = self.update_snapshot(distribution,)?;
            summary.snapshots_updated.push(SyncedVersion {
                distribution,
                version,
            },);
        }

        info!(
            "Sync complete: {} new release(s), {} snapshot(s) updated",
            summary.new_releases.len(),
            summary.snapshots_updated.len()
        );
        Ok(summary,)
    }

    /// Scans and saves every release in `versions` that is not tracked yet.
    ///
    /// Snapshots are skipped. Returns the versions written, in input order.
    ///
    /// # Errors
    ///
    /// Stops at the first version that fails to check out, scan or save.
    pub fn backfill(&self, distribution: Distribution, versions: &[Version],) -> Result<Vec<Version,>, Error,>
    {
        let mut processed = Vec::new();
        for version in versions {
            if version.is_prerelease {
                info!("Skipping snapshot {distribution} {version}");
                continue;
            }
            if self.inventory.version_exists(distribution, version,) {
                info!("Version {distribution} {version} already tracked");
                continue;
            }
            let components = self.scan_version(distribution, version, true,)?;
            self.save_version(distribution, version, &components,)?;
            processed.push(*version,);
        }
        Ok(processed,)
    }

    /// Working tree of `distribution`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the distribution is not configured.
    pub fn checkout_path(&self, distribution: Distribution,) -> Result<&Path, Error,>
    {
        Ok(&self.checkout_for(distribution,)?.path,)
    }
}
