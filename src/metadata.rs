// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Parses and normalizes component `metadata.yaml` files.
//!
//! Only an allow-listed subset of the upstream metadata schema is kept. The
//! result is deterministic: keyed sections are sorted by key, every list
//! sub-field is sorted and description text is whitespace-collapsed, so two
//! scans of the same tree produce byte-identical inventory files.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::error::Error;

/// File name looked up inside each component directory.
pub const METADATA_FILE_NAME: &str = "metadata.yaml";

/// Normalized component metadata in its fixed field order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize,)]
pub struct NormalizedMetadata
{
    /// Component type identifier (`otlp`, `kafka`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub component_type:      Option<String,>,
    /// Human readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name:        Option<String,>,
    /// Whitespace-collapsed description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description:         Option<String,>,
    /// Stability and ownership information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status:              Option<Status,>,
    /// Telemetry attributes keyed by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes:          Option<BTreeMap<String, AttributeEntry,>,>,
    /// Metrics keyed by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics:             Option<BTreeMap<String, MetricEntry,>,>,
    /// Resource attributes keyed by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_attributes: Option<BTreeMap<String, AttributeEntry,>,>,
}

/// `status` section of the metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize,)]
pub struct Status
{
    /// Component class (`receiver`, `extension`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class:                 Option<String,>,
    /// Signals per stability level (`beta: [logs, traces]`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability:             Option<BTreeMap<String, Vec<String,>,>,>,
    /// Distributions shipping the component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distributions:         Option<Vec<String,>,>,
    /// Code owner block, copied as is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codeowners:            Option<Value,>,
    /// Platforms the component does not support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsupported_platforms: Option<Vec<String,>,>,
}

impl Status
{
    /// Returns true when at least one stability level is declared.
    pub fn has_stability(&self,) -> bool
    {
        self.stability.as_ref().is_some_and(|levels| !levels.is_empty(),)
    }

    /// Stability level declared for `signal`, if any. When several levels
    /// list the signal, the alphabetically last one wins.
    pub fn stability_for(&self, signal: &str,) -> Option<&str,>
    {
        self.stability.as_ref()?.iter().rev().find_map(|(level, signals,)| {
            signals.iter().any(|candidate| candidate == signal,).then_some(level.as_str(),)
        },)
    }
}

/// Attribute definition, or the raw value when it is not a mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
#[serde(untagged)]
pub enum AttributeEntry
{
    /// Structured attribute definition.
    Defined(AttributeSpec,),
    /// Non-mapping value copied unchanged.
    Opaque(Value,),
}

/// Allow-listed attribute fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize,)]
pub struct AttributeSpec
{
    /// Whitespace-collapsed description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description:   Option<String,>,
    /// Attribute value type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type:    Option<String,>,
    /// Emitted attribute name when it differs from the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_override: Option<String,>,
    /// Sorted enumeration of allowed values.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed:       Option<Vec<String,>,>,
}

/// Metric definition, or the raw value when it is not a mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
#[serde(untagged)]
pub enum MetricEntry
{
    /// Structured metric definition.
    Defined(MetricSpec,),
    /// Non-mapping value copied unchanged.
    Opaque(Value,),
}

/// Allow-listed metric fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize,)]
pub struct MetricSpec
{
    /// Whitespace-collapsed description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String,>,
    /// Unit of measure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit:        Option<String,>,
    /// Whether the metric is enabled by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled:     Option<bool,>,
    /// Sum instrument definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum:         Option<Value,>,
    /// Gauge instrument definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gauge:       Option<Value,>,
    /// Histogram instrument definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram:   Option<Value,>,
    /// Sorted attribute names recorded on the metric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes:  Option<Vec<String,>,>,
    /// Metric-level stability block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability:   Option<Value,>,
}

/// Reads the metadata file of a single component directory.
#[derive(Debug, Clone,)]
pub struct MetadataParser
{
    metadata_path: PathBuf,
}

impl MetadataParser
{
    /// Creates a parser for `component_dir`.
    pub fn new(component_dir: &Path,) -> Self
    {
        Self {
            metadata_path: component_dir.join(METADATA_FILE_NAME,),
        }
    }

    /// Location of the metadata file.
    pub fn metadata_path(&self,) -> &Path
    {
        &self.metadata_path
    }

    /// Returns true when the component ships a metadata file.
    pub fn has_metadata(&self,) -> bool
    {
        self.metadata_path.is_file()
    }

    /// Parses and normalizes the metadata file.
    ///
    /// Returns `None` when the file is absent, empty or malformed. Malformed
    /// files are reported with a warning and never fail the caller.
    pub fn parse(&self,) -> Option<NormalizedMetadata,>
    {
        if !self.has_metadata() {
            return None;
        }

        let content = match fs::read_to_string(&self.metadata_path,) {
            Ok(content,) => content,
            Err(error,) => {
                warn!("Failed to read {}: {}", self.metadata_path.display(), error);
                return None;
            }
        };

        match parse_metadata_str(&content,) {
            Ok(metadata,) => metadata,
            Err(error,) => {
                warn!("Failed to parse {}: {}", self.metadata_path.display(), error);
                None
            }
        }
    }
}

/// Parses metadata text into its normalized form.
///
/// Returns `Ok(None)` for empty documents.
///
/// # Errors
///
/// Returns [`Error::Yaml`] for invalid YAML and [`Error::Validation`] when
/// the document or one of its sections has the wrong shape.
pub fn parse_metadata_str(content: &str,) -> Result<Option<NormalizedMetadata,>, Error,>
{
    let raw: Value = serde_yaml::from_str(content,)?;
    normalize_metadata(&raw,)
}

/// Normalizes an already decoded metadata document.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the document or one of its sections
/// has the wrong shape.
pub fn normalize_metadata(raw: &Value,) -> Result<Option<NormalizedMetadata,>, Error,>
{
    let document = match raw {
        Value::Null => return Ok(None,),
        Value::Mapping(mapping,) if mapping.is_empty() => return Ok(None,),
        Value::Mapping(mapping,) => mapping,
        _ => return Err(Error::validation("metadata document must be a mapping",),),
    };

    let metadata = NormalizedMetadata {
        component_type:      document.get("type",).and_then(scalar_string,),
        display_name:        document.get("display_name",).and_then(scalar_string,),
        description:         document.get("description",).and_then(description_text,),
        status:              document.get("status",).map(normalize_status,).transpose()?,
        attributes:          document.get("attributes",).map(normalize_attributes,).transpose()?,
        metrics:             document.get("metrics",).map(normalize_metrics,).transpose()?,
        resource_attributes: document
            .get("resource_attributes",)
            .map(normalize_attributes,)
            .transpose()?,
    };
    debug!("Normalized metadata for type {:?}", metadata.component_type);
    Ok(Some(metadata,),)
}

fn normalize_status(value: &Value,) -> Result<Status, Error,>
{
    let status = section(value, "status",)?;

    let stability = match status.get("stability",) {
        None | Some(Value::Null,) => None,
        Some(levels,) => {
            let mut sorted = BTreeMap::new();
            for (level, signals,) in section(levels, "status.stability",)? {
                if let (Some(level,), Some(signals,),) = (scalar_string(level,), sorted_strings(signals,),) {
                    sorted.insert(level, signals,);
                }
            }
            Some(sorted,)
        }
    };

    Ok(Status {
        class: status.get("class",).and_then(scalar_string,),
        stability,
        distributions: status.get("distributions",).and_then(sorted_strings,),
        codeowners: status.get("codeowners",).filter(|value| !value.is_null(),).cloned(),
        unsupported_platforms: status.get("unsupported_platforms",).and_then(sorted_strings,),
    },)
}

fn normalize_attributes(value: &Value,) -> Result<BTreeMap<String, AttributeEntry,>, Error,>
{
    keyed_section(value, "attributes", |entry| match entry {
        Value::Mapping(attribute,) => AttributeEntry::Defined(AttributeSpec {
            description:   attribute.get("description",).and_then(description_text,),
            value_type:    attribute.get("type",).and_then(scalar_string,),
            name_override: attribute.get("name_override",).and_then(scalar_string,),
            allowed:       attribute.get("enum",).and_then(sorted_strings,),
        },),
        other => AttributeEntry::Opaque(other.clone(),),
    },)
}

fn normalize_metrics(value: &Value,) -> Result<BTreeMap<String, MetricEntry,>, Error,>
{
    keyed_section(value, "metrics", |entry| match entry {
        Value::Mapping(metric,) => MetricEntry::Defined(MetricSpec {
            description: metric.get("description",).and_then(description_text,),
            unit:        metric.get("unit",).and_then(scalar_string,),
            enabled:     metric.get("enabled",).and_then(Value::as_bool,),
            sum:         present(metric, "sum",),
            gauge:       present(metric, "gauge",),
            histogram:   present(metric, "histogram",),
            attributes:  metric.get("attributes",).and_then(sorted_strings,),
            stability:   present(metric, "stability",),
        },),
        other => MetricEntry::Opaque(other.clone(),),
    },)
}

fn keyed_section<T, F,>(value: &Value, name: &str, mut convert: F,) -> Result<BTreeMap<String, T,>, Error,>
where
    F: FnMut(&Value,) -> T,
{
    if value.is_null() {
        return Ok(BTreeMap::new(),);
    }
    let mut sorted = BTreeMap::new();
    for (key, entry,) in section(value, name,)? {
        let key = scalar_string(key,)
            .ok_or_else(|| Error::validation(format!("{name} keys must be scalars"),),)?;
        sorted.insert(key, convert(entry,),);
    }
    Ok(sorted,)
}

fn section<'a,>(value: &'a Value, name: &str,) -> Result<&'a Mapping, Error,>
{
    value
        .as_mapping()
        .ok_or_else(|| Error::validation(format!("metadata section `{name}` must be a mapping"),),)
}

fn present(mapping: &Mapping, key: &str,) -> Option<Value,>
{
    mapping.get(key,).filter(|value| !value.is_null(),).cloned()
}

fn scalar_string(value: &Value,) -> Option<String,>
{
    match value {
        Value::String(text,) => Some(text.clone(),),
        Value::Bool(flag,) => Some(flag.to_string(),),
        Value::Number(number,) => Some(number.to_string(),),
        _ => None,
    }
}

/// Collapses every whitespace run (including newlines) into one space.
fn description_text(value: &Value,) -> Option<String,>
{
    scalar_string(value,).map(|text| text.split_whitespace().collect::<Vec<_,>>().join(" ",),)
}

fn sorted_strings(value: &Value,) -> Option<Vec<String,>,>
{
    let mut items = match value {
        Value::Sequence(items,) => items.iter().filter_map(scalar_string,).collect::<Vec<_,>>(),
        Value::Null => return None,
        scalar => vec![scalar_string(scalar,)?],
    };
    items.sort();
    Some(items,)
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    const RECEIVER_METADATA: &str = r#"
type: otlp
display_name: OTLP Receiver
description: |
  Receives data
    over gRPC  or HTTP.
status:
  class: receiver
  stability:
    stable: [traces, metrics]
    beta: [logs]
  distributions: [core, contrib]
  codeowners:
    active: [alice]
attributes:
  state:
    description: The state.
    type: string
    enum: [z, a]
  cpu:
    description: CPU number.
    type: int
metrics:
  system.cpu.time:
    description: Total CPU time.
    unit: s
    enabled: true
    sum:
      monotonic: true
    attributes: [state, cpu]
"#;

    #[test]
    fn normalizes_sections_and_sorts_lists()
    {
        let metadata = parse_metadata_str(RECEIVER_METADATA,)
            .expect("valid metadata",)
            .expect("non-empty metadata",);

        assert_eq!(metadata.component_type.as_deref(), Some("otlp"));
        assert_eq!(metadata.description.as_deref(), Some("Receives data over gRPC or HTTP."));

        let status = metadata.status.expect("status present",);
        let stability = status.stability.expect("stability present",);
        assert_eq!(stability.keys().collect::<Vec<_,>>(), ["beta", "stable"]);
        assert_eq!(stability["stable"], ["metrics", "traces"]);
        assert_eq!(status.distributions, Some(vec!["contrib".to_string(), "core".to_string()]));

        let attributes = metadata.attributes.expect("attributes present",);
        assert_eq!(attributes.keys().collect::<Vec<_,>>(), ["cpu", "state"]);
        match &attributes["state"] {
            AttributeEntry::Defined(spec,) => {
                assert_eq!(spec.allowed, Some(vec!["a".to_string(), "z".to_string()]));
            }
            other => panic!("expected defined attribute, got {other:?}"),
        }

        let metrics = metadata.metrics.expect("metrics present",);
        match &metrics["system.cpu.time"] {
            MetricEntry::Defined(spec,) => {
                assert_eq!(spec.attributes, Some(vec!["cpu".to_string(), "state".to_string()]));
                assert_eq!(spec.enabled, Some(true));
                assert!(spec.gauge.is_none());
            }
            other => panic!("expected defined metric, got {other:?}"),
        }
    }

    #[test]
    fn output_is_stable_under_input_permutation()
    {
        let permuted = r#"
metrics:
  system.cpu.time:
    attributes: [cpu, state]
    sum:
      monotonic: true
    enabled: true
    unit: s
    description: Total CPU time.
attributes:
  cpu:
    type: int
    description: CPU number.
  state:
    enum: [a, z]
    type: string
    description: The state.
status:
  codeowners:
    active: [alice]
  distributions: [contrib, core]
  stability:
    beta: [logs]
    stable: [metrics, traces]
  class: receiver
description: "Receives data over gRPC or HTTP."
display_name: OTLP Receiver
type: otlp
"#;
        let left = parse_metadata_str(RECEIVER_METADATA,).expect("valid",);
        let right = parse_metadata_str(permuted,).expect("valid",);
        assert_eq!(
            serde_yaml::to_string(&left,).expect("serializes",),
            serde_yaml::to_string(&right,).expect("serializes",)
        );
    }

    #[test]
    fn absent_fields_are_not_introduced()
    {
        let metadata = parse_metadata_str("type: nop\nstatus:\n  class: exporter\n",)
            .expect("valid",)
            .expect("non-empty",);
        let yaml = serde_yaml::to_string(&metadata,).expect("serializes",);
        assert_eq!(yaml, "type: nop\nstatus:\n  class: exporter\n");
        assert!(!yaml.contains("null"));
    }

    #[test]
    fn non_mapping_attribute_is_copied()
    {
        let metadata = parse_metadata_str("attributes:\n  flag: true\n",)
            .expect("valid",)
            .expect("non-empty",);
        let attributes = metadata.attributes.expect("attributes present",);
        assert_eq!(attributes["flag"], AttributeEntry::Opaque(Value::Bool(true,),));
    }

    #[test]
    fn parser_returns_none_for_missing_empty_and_malformed_files()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let parser = MetadataParser::new(dir.path(),);
        assert!(!parser.has_metadata());
        assert!(parser.parse().is_none());

        fs::write(parser.metadata_path(), "",).expect("write empty metadata",);
        assert!(parser.has_metadata());
        assert!(parser.parse().is_none());

        fs::write(parser.metadata_path(), "type: [unclosed\n",).expect("write malformed metadata",);
        assert!(parser.parse().is_none());

        fs::write(parser.metadata_path(), "status: not-a-mapping\n",).expect("write bad status",);
        assert!(parser.parse().is_none());

        fs::write(parser.metadata_path(), "type: debug\n",).expect("write valid metadata",);
        let metadata = parser.parse().expect("valid metadata parses",);
        assert_eq!(metadata.component_type.as_deref(), Some("debug"));
    }

    #[test]
    fn stability_lookup_finds_signal_level()
    {
        let metadata = parse_metadata_str(RECEIVER_METADATA,).expect("valid",).expect("non-empty",);
        let status = metadata.status.expect("status present",);
        assert!(status.has_stability());
        assert_eq!(status.stability_for("logs"), Some("beta"));
        assert_eq!(status.stability_for("profiles"), None);
    }

    #[test]
    fn stability_lookup_prefers_last_level_listing_signal()
    {
        let status = Status {
            stability: Some(BTreeMap::from([
                ("alpha".to_string(), vec!["traces".to_string()],),
                ("deprecated".to_string(), vec!["traces".to_string(), "logs".to_string()],),
            ],),),
            ..Status::default()
        };
        assert_eq!(status.stability_for("traces"), Some("deprecated"));
        assert_eq!(status.stability_for("logs"), Some("deprecated"));
    }
}
