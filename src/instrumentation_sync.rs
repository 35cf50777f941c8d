// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Keeps the Java agent instrumentation inventory in step with upstream.
//!
//! The instrumentation list is fetched per git ref from an
//! [`InstrumentationSource`], parsed, and stored per version.

use serde::Serialize;
use tracing::info;

use crate::{
    error::Error,
    git::MAIN_BRANCH,
    instrumentation::parse_instrumentation_yaml,
    instrumentation_inventory::InstrumentationInventory,
    version::Version,
};

/// Upstream of the instrumentation list.
pub trait InstrumentationSource
{
    /// Tag of the latest published release, such as `v2.24.0`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when the release cannot be looked up.
    fn latest_release_tag(&self,) -> Result<String, Error,>;

    /// Tags of all published releases.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when the releases cannot be listed.
    fn release_tags(&self,) -> Result<Vec<String,>, Error,>;

    /// Raw instrumentation list YAML at `git_ref`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when the file cannot be fetched.
    fn fetch_instrumentation_list(&self, git_ref: &str,) -> Result<String, Error,>;
}

/// What an instrumentation sync run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize,)]
pub struct InstrumentationSyncSummary
{
    /// Newly stored release, if the latest one was not tracked yet.
    pub new_release:      Option<Version,>,
    /// Snapshot rebuilt from the main branch.
    pub snapshot_updated: Option<Version,>,
}

/// Fetches, parses and stores instrumentation lists.
pub struct InstrumentationSync<S,>
{
    source:     S,
    inventory:  InstrumentationInventory,
    repository: String,
}

impl<S: InstrumentationSource,> InstrumentationSync<S,>
{
    /// Sync storing into `inventory` with `repository` as label.
    pub fn new(source: S, inventory: InstrumentationInventory, repository: impl Into<String,>,) -> Self
    {
        Self {
            source,
            inventory,
            repository: repository.into(),
        }
    }

    /// Inventory written to.
    pub fn inventory(&self,) -> &InstrumentationInventory
    {
        &self.inventory
    }

    /// Underlying source.
    pub fn source(&self,) -> &S
    {
        &self.source
    }

    /// Newest published release as a version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] when the tag is not a version.
    pub fn latest_release(&self,) -> Result<Version, Error,>
    {
        Version::parse(self.source.latest_release_tag()?.trim(),)
    }

    fn store(&self, version: &Version, git_ref: &str,) -> Result<(), Error,>
    {
        info!("Fetching instrumentation list for {git_ref}");
        let content = self.source.fetch_instrumentation_list(git_ref,)?;
        let document = parse_instrumentation_yaml(&content, None,)?;
        self.inventory.save(version, &document, &self.repository,)
    }

    /// Stores the latest release unless it is already tracked.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when fetching, parsing or saving fails.
    pub fn process_latest_release(&self,) -> Result<Option<Version,>, Error,>
    {
        let latest = self.latest_release()?;
        info!("Latest release tag: {latest}");
        if self.inventory.version_exists(&latest,) {
            return Ok(None,);
        }

        self.store(&latest, &latest.to_string(),)?;
        Ok(Some(latest,),)
    }

    /// Replaces the snapshot with the list on the main branch, versioned as
    /// the patch after the latest release.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when cleanup, fetching, parsing or saving fails.
    pub fn update_snapshot(&self,) -> Result<Version, Error,>
    {
        let removed = self.inventory.cleanup_snapshots()?;
        if removed > 0 {
            info!("Removed {removed} old snapshot(s)");
        }

        let snapshot = self.latest_release()?.next_patch()?.as_snapshot();
        self.store(&snapshot, MAIN_BRANCH,)?;
        Ok(snapshot,)
    }

    /// Processes the latest release, then refreshes the snapshot.
    ///
    /// # Errors
    ///
    /// Propagates the first failure.
    pub fn sync(&self,) -> Result<InstrumentationSyncSummary, Error,>
    {
        let new_release = self.process_latest_release()?;
        match &new_release {
            Some(version,) => info!("Processed new release: {version}"),
            None => info!("Latest release already tracked"),
        }

        let snapshot = self.update_snapshot()?;
        info!("Updated snapshot: {snapshot}");
        Ok(InstrumentationSyncSummary {
            new_release,
            snapshot_updated: Some(snapshot,),
        },)
    }

    /// Release versions published upstream, newest first.
    ///
    /// # Errors
    ///
    /// Propagates [`InstrumentationSource::release_tags`] failures.
    pub fn available_releases(&self,) -> Result<Vec<Version,>, Error,>
    {
        let tags = self.source.release_tags()?;
        Ok(crate::git::release_versions_from_tags(tags.iter().map(String::as_str,),),)
    }

    /// Stores every release in `versions` that is not tracked yet, skipping
    /// snapshots. Returns the versions written.
    ///
    /// # Errors
    ///
    /// Stops at the first version that fails.
    pub fn backfill(&self, versions: &[Version],) -> Result<Vec<Version,>, Error,>
    {
        let mut processed = Vec::new();
        for version in versions.iter().filter(|version| !version.is_prerelease,) {
            if self.inventory.version_exists(version,) {
                info!("Version {version} already tracked");
                continue;
            }
            self.store(version, &version.to_string(),)?;
            processed.push(*version,);
        }
        Ok(processed,)
    }
}

#[cfg(test)]
mod tests
{
    use std::cell::RefCell;

    use serde_yaml::Value;
    use tempfile::tempdir;

    use super::*;

    const LIST: &str = "file_format: 0.1\nlibraries:\n  akka:\n    - name: akka-actor-2.3\n      source_path: instrumentation/akka\n";

    struct FakeSource
    {
        latest:  &'static str,
        tags:    Vec<String,>,
        fetched: RefCell<Vec<String,>,>,
    }

    impl FakeSource
    {
        fn new(latest: &'static str,) -> Self
        {
            Self {
                latest,
                tags: vec!["v2.20.0".to_string(), "v2.21.0".to_string(), "v2.22.0-SNAPSHOT".to_string()],
                fetched: RefCell::default(),
            }
        }
    }

    impl InstrumentationSource for FakeSource
    {
        fn latest_release_tag(&self,) -> Result<String, Error,>
        {
            Ok(self.latest.to_string(),)
        }

        fn release_tags(&self,) -> Result<Vec<String,>, Error,>
        {
            Ok(self.tags.clone(),)
        }

        fn fetch_instrumentation_list(&self, git_ref: &str,) -> Result<String, Error,>
        {
            self.fetched.borrow_mut().push(git_ref.to_string(),);
            Ok(LIST.to_string(),)
        }
    }

    fn fetched(sync: &InstrumentationSync<FakeSource,>,) -> Vec<String,>
    {
        sync.source().fetched.borrow().clone()
    }

    #[test]
    fn sync_stores_release_and_snapshot()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let sync = InstrumentationSync::new(
            FakeSource::new("v2.24.0",),
            InstrumentationInventory::new(dir.path(),),
            "opentelemetry-java-instrumentation",
        );
        let summary = sync.sync().expect("sync failed",);

        assert_eq!(summary.new_release, Some(Version::new(2, 24, 0,)));
        assert_eq!(summary.snapshot_updated, Some(Version::new(2, 24, 1,).as_snapshot()));
        assert_eq!(fetched(&sync,), ["v2.24.0", "main"]);

        let stored = sync.inventory().load(&Version::new(2, 24, 0,),).expect("load failed",);
        assert_eq!(stored.get("version"), Some(&Value::from("2.24.0")));
        let libraries = stored.get("libraries",).and_then(Value::as_sequence,).expect("libraries missing",);
        assert_eq!(libraries[0].get("tags"), Some(&Value::Sequence(vec![Value::from("akka")])));
    }

    #[test]
    fn second_sync_only_refreshes_snapshot()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let sync = InstrumentationSync::new(FakeSource::new("2.24.0",), InstrumentationInventory::new(dir.path(),), "repo",);
        sync.sync().expect("first sync failed",);
        let summary = sync.sync().expect("second sync failed",);

        assert_eq!(summary.new_release, None);
        assert_eq!(sync.inventory().list_snapshot_versions().expect("listing failed",).len(), 1);
    }

    #[test]
    fn backfill_uses_release_tags()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let sync = InstrumentationSync::new(FakeSource::new("v2.24.0",), InstrumentationInventory::new(dir.path(),), "repo",);

        let releases = sync.available_releases().expect("listing failed",);
        assert_eq!(releases, [Version::new(2, 21, 0,), Version::new(2, 20, 0,)]);

        let processed = sync.backfill(&releases,).expect("backfill failed",);
        assert_eq!(processed.len(), 2);
        assert_eq!(fetched(&sync,), ["v2.21.0", "v2.20.0"]);
        assert!(sync.backfill(&releases,).expect("repeat backfill failed",).is_empty());
    }

    #[test]
    fn malformed_latest_tag_is_rejected()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let sync = InstrumentationSync::new(FakeSource::new("nightly",), InstrumentationInventory::new(dir.path(),), "repo",);
        assert!(matches!(sync.process_latest_release(), Err(Error::InvalidVersion { .. })));
    }
}
