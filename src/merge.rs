// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Unification of the core and contrib inventories.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::{
    component::{ComponentRecord, ComponentType, ComponentsByType, Distribution, ExtensionSubtype},
    metadata::{NormalizedMetadata, Status},
};

/// Component of the merged view, attributed to the repository holding its
/// code.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct MergedComponent
{
    /// Component name.
    pub name:         String,
    /// Extension group, when nested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype:      Option<ExtensionSubtype,>,
    /// Repository the component lives in.
    pub source_repo:  Distribution,
    /// Metadata, with `status.distributions` unified on collisions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata:     Option<NormalizedMetadata,>,
    /// Whether the scan found usable metadata on either side.
    pub has_metadata: bool,
}

impl MergedComponent
{
    fn from_record(record: &ComponentRecord, source_repo: Distribution,) -> Self
    {
        Self {
            name: record.name.clone(),
            subtype: record.subtype,
            source_repo,
            metadata: record.metadata.clone(),
            has_metadata: record.has_metadata,
        }
    }

    /// `status.distributions`, empty when absent.
    pub fn distributions(&self,) -> &[String]
    {
        self.status().and_then(|status| status.distributions.as_deref(),).unwrap_or_default()
    }

    /// Metadata status block, if any.
    pub fn status(&self,) -> Option<&Status,>
    {
        self.metadata.as_ref()?.status.as_ref()
    }
}

/// Merged components per category, each list sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize,)]
pub struct MergedInventory
{
    /// Components per category.
    pub components: BTreeMap<ComponentType, Vec<MergedComponent,>,>,
}

/// Merges core and contrib components.
///
/// Core entries are taken first and keep `source_repo = core`. A contrib
/// entry with the same name unions its distributions into the existing entry
/// and only contributes its metadata when the existing entry has none. The
/// per-category placeholder (`xreceiver`, ...) is skipped on both sides.
/// Within one side a repeated name replaces the earlier core entry and folds
/// into the earlier contrib entry.
pub fn merge_inventories(core: &ComponentsByType, contrib: &ComponentsByType,) -> MergedInventory
{
    let kinds: BTreeSet<ComponentType,> = core.keys().chain(contrib.keys(),).copied().collect();
    let mut merged = MergedInventory::default();

    for kind in kinds {
        let placeholder = kind.placeholder_name();
        let mut by_name: BTreeMap<String, MergedComponent,> = BTreeMap::new();

        for record in core.get(&kind,).into_iter().flatten() {
            if record.name == placeholder {
                continue;
            }
            by_name.insert(record.name.clone(), MergedComponent::from_record(record, Distribution::Core,),);
        }

        for record in contrib.get(&kind,).into_iter().flatten() {
            if record.name == placeholder {
                continue;
            }
            match by_name.get_mut(&record.name,) {
                Some(existing,) => merge_into(existing, record,),
                None => {
                    by_name.insert(
                        record.name.clone(),
                        MergedComponent::from_record(record, Distribution::Contrib,),
                    );
                }
            }
        }

        debug!("Merged {} {} components", by_name.len(), kind);
        merged.components.insert(kind, by_name.into_values().collect(),);
    }

    merged
}

fn merge_into(existing: &mut MergedComponent, other: &ComponentRecord,)
{
    let other_distributions = other
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.status.as_ref(),)
        .and_then(|status| status.distributions.as_deref(),)
        .unwrap_or_default();
    let union: BTreeSet<String,> =
        existing.distributions().iter().chain(other_distributions,).cloned().collect();

    if existing.metadata.is_none()
        && let Some(metadata,) = &other.metadata
    {
        existing.metadata = Some(metadata.clone(),);
        existing.has_metadata = true;
    }

    let metadata = existing.metadata.get_or_insert_with(NormalizedMetadata::default,);
    let status = metadata.status.get_or_insert_with(Status::default,);
    status.distributions = Some(union.into_iter().collect(),);
}
