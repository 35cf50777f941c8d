// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Component categories, distributions and scan records.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::Error, metadata::NormalizedMetadata};

/// Closed set of collector component categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType
{
    /// Connects a pipeline output to another pipeline input.
    Connector,
    /// Sends telemetry to a backend.
    Exporter,
    /// Adds capabilities outside of pipelines.
    Extension,
    /// Transforms telemetry in a pipeline.
    Processor,
    /// Ingests telemetry.
    Receiver,
}

impl ComponentType
{
    /// Every category in scan order.
    pub const ALL: [Self; 5] =
        [Self::Connector, Self::Exporter, Self::Extension, Self::Processor, Self::Receiver,];

    /// Directory and file stem used for this category.
    pub const fn as_str(self,) -> &'static str
    {
        match self {
            Self::Connector => "connector",
            Self::Exporter => "exporter",
            Self::Extension => "extension",
            Self::Processor => "processor",
            Self::Receiver => "receiver",
        }
    }

    /// Name of the placeholder component every category ships (`xreceiver`).
    pub fn placeholder_name(self,) -> String
    {
        format!("x{}", self.as_str())
    }
}

impl fmt::Display for ComponentType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.as_str(),)
    }
}

impl FromStr for ComponentType
{
    type Err = Error;

    fn from_str(s: &str,) -> Result<Self, Self::Err,>
    {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s,)
            .ok_or_else(|| Error::validation(format!("unknown component type: {s}"),),)
    }
}

/// Grouping directories nested under `extension/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionSubtype
{
    /// Encoding extensions.
    Encoding,
    /// Observer extensions.
    Observer,
    /// Storage extensions.
    Storage,
}

impl ExtensionSubtype
{
    /// Every subtype.
    pub const ALL: [Self; 3] = [Self::Encoding, Self::Observer, Self::Storage,];

    /// Directory name of the group.
    pub const fn as_str(self,) -> &'static str
    {
        match self {
            Self::Encoding => "encoding",
            Self::Observer => "observer",
            Self::Storage => "storage",
        }
    }

    /// Looks up a subtype by directory name.
    pub fn from_dir_name(name: &str,) -> Option<Self,>
    {
        Self::ALL.into_iter().find(|subtype| subtype.as_str() == name,)
    }
}

impl fmt::Display for ExtensionSubtype
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.as_str(),)
    }
}

/// Collector distributions tracked in the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,)]
#[serde(rename_all = "lowercase")]
pub enum Distribution
{
    /// `opentelemetry-collector`.
    Core,
    /// `opentelemetry-collector-contrib`.
    Contrib,
}

impl Distribution
{
    /// Both distributions.
    pub const ALL: [Self; 2] = [Self::Core, Self::Contrib,];

    /// Directory name under the inventory root.
    pub const fn as_str(self,) -> &'static str
    {
        match self {
            Self::Core => "core",
            Self::Contrib => "contrib",
        }
    }

    /// Upstream repository name.
    pub const fn repository_name(self,) -> &'static str
    {
        match self {
            Self::Core => "opentelemetry-collector",
            Self::Contrib => "opentelemetry-collector-contrib",
        }
    }
}

impl fmt::Display for Distribution
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.as_str(),)
    }
}

impl FromStr for Distribution
{
    type Err = Error;

    fn from_str(s: &str,) -> Result<Self, Self::Err,>
    {
        Self::ALL
            .into_iter()
            .find(|dist| dist.as_str() == s,)
            .ok_or_else(|| Error::validation(format!("unknown distribution: {s}"),),)
    }
}

fn default_true() -> bool
{
    true
}

fn is_true(value: &bool,) -> bool
{
    *value
}

/// One discovered component.
///
/// `has_metadata` is serialized only when false, so records without metadata
/// state it explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct ComponentRecord
{
    /// Directory name of the component.
    pub name:         String,
    /// Extension group, when nested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype:      Option<ExtensionSubtype,>,
    /// Parsed and normalized `metadata.yaml`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata:     Option<NormalizedMetadata,>,
    /// False when metadata is missing or could not be parsed.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub has_metadata: bool,
}

impl ComponentRecord
{
    /// Builds a record, deriving `has_metadata` from `metadata`.
    pub fn new(
        name: impl Into<String,>,
        subtype: Option<ExtensionSubtype,>,
        metadata: Option<NormalizedMetadata,>,
    ) -> Self
    {
        let has_metadata = metadata.is_some();
        Self {
            name: name.into(), subtype, metadata, has_metadata,
        }
    }
}

/// Scan output keyed by category.
pub type ComponentsByType = BTreeMap<ComponentType, Vec<ComponentRecord,>,>;

/// Returns a map holding an empty list for every category.
pub fn empty_components() -> ComponentsByType
{
    ComponentType::ALL.into_iter().map(|kind| (kind, Vec::new(),),).collect()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn component_type_round_trips_through_str()
    {
        for kind in ComponentType::ALL {
            assert_eq!(kind.as_str().parse::<ComponentType>().expect("known type"), kind);
        }
        assert!("xreceiver".parse::<ComponentType>().is_err());
    }

    #[test]
    fn record_without_metadata_serializes_flag()
    {
        let record = ComponentRecord::new("otlpreceiver", None, None,);
        let yaml = serde_yaml::to_string(&record,).expect("serializes",);
        assert_eq!(yaml, "name: otlpreceiver\nhas_metadata: false\n");
    }

    #[test]
    fn record_deserializes_with_default_flag()
    {
        let record: ComponentRecord =
            serde_yaml::from_str("name: zipkin\nmetadata:\n  type: zipkin\n",).expect("parses",);
        assert!(record.has_metadata);
        assert_eq!(record.metadata.and_then(|meta| meta.component_type), Some("zipkin".to_string()));
    }

    #[test]
    fn placeholder_name_prefixes_x()
    {
        assert_eq!(ComponentType::Connector.placeholder_name(), "xconnector");
    }
}
