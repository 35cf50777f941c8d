// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Versioned parsing of the Java agent `instrumentation-list.yaml`.

use std::{fmt, str::FromStr};

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::Error;

const FORMAT_KEY: &str = "file_format";
const LIBRARIES_KEY: &str = "libraries";
const TARGET_VERSIONS_KEY: &str = "target_versions";

/// Known layouts of the instrumentation list, keyed by `file_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,)]
pub enum FileFormat
{
    /// `file_format: 0.1`
    V0_1,
    /// `file_format: 0.2`, splits `target_versions` per agent kind.
    V0_2,
}

impl FileFormat
{
    /// Every supported format, oldest first.
    pub const ALL: [Self; 2] = [Self::V0_1, Self::V0_2,];
    /// Format used when the document carries no usable tag.
    pub const LATEST: Self = Self::V0_2;

    /// Numeric tag of the format.
    pub const fn tag(self,) -> f64
    {
        match self {
            Self::V0_1 => 0.1,
            Self::V0_2 => 0.2,
        }
    }

    /// Resolves a numeric tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] naming the supported set.
    pub fn from_tag(tag: f64,) -> Result<Self, Error,>
    {
        Self::ALL.into_iter().find(|format| format.tag() == tag,).ok_or_else(|| unsupported(tag,),)
    }

    /// Normalizes a decoded document: trims every string value, flattens the
    /// grouped `libraries` mapping and applies format-specific renames.
    pub fn normalize(self, document: Value,) -> Value
    {
        let cleaned = trim_strings(document,);
        match self {
            Self::V0_1 => flatten_libraries(cleaned, |_| {},),
            Self::V0_2 => flatten_libraries(cleaned, split_target_versions,),
        }
    }
}

impl fmt::Display for FileFormat
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for FileFormat
{
    type Err = Error;

    fn from_str(s: &str,) -> Result<Self, Self::Err,>
    {
        let tag = s.trim().parse::<f64>().map_err(|_| Error::UnsupportedFormat {
            format:    s.to_string(),
            supported: supported_list(),
        },)?;
        Self::from_tag(tag,)
    }
}

fn supported_list() -> String
{
    FileFormat::ALL.iter().map(ToString::to_string,).collect::<Vec<_,>>().join(", ",)
}

fn unsupported(tag: impl fmt::Display,) -> Error
{
    Error::UnsupportedFormat {
        format: tag.to_string(), supported: supported_list(),
    }
}

/// Parses instrumentation list text.
///
/// The explicit `format` wins; otherwise the document's `file_format` tag is
/// used, and a document without a tag (or one that cannot be decoded for
/// detection) falls back to [`FileFormat::LATEST`].
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for an unknown tag,
/// [`Error::Validation`] wrapping the decoder message for malformed text and
/// for documents that are not mappings.
///
/// # Example
///
/// ```
/// use ecosystem_automation::parse_instrumentation_yaml;
///
/// let yaml = "file_format: 0.2\nlibraries:\n  kafka:\n    - name: kafka-clients-0.11\n";
/// let document = parse_instrumentation_yaml(yaml, None).unwrap();
/// let libraries = document.get("libraries").and_then(|value| value.as_sequence()).unwrap();
/// assert_eq!(libraries[0]["tags"][0].as_str(), Some("kafka"));
/// ```
pub fn parse_instrumentation_yaml(content: &str, format: Option<FileFormat,>,) -> Result<Mapping, Error,>
{
    let format = match format {
        Some(format,) => format,
        None => detect_format(content,)?,
    };
    debug!("Parsing instrumentation list with file_format {format}");

    let document: Value = serde_yaml::from_str(content,)
        .map_err(|error| Error::validation(format!("error parsing instrumentation YAML: {error}"),),)?;
    let document = if document.is_null() { Value::Mapping(Mapping::new(),) } else { document };

    match format.normalize(document,) {
        Value::Mapping(mapping,) => Ok(mapping,),
        _ => Err(Error::validation("instrumentation list must be a mapping",),),
    }
}

fn detect_format(content: &str,) -> Result<FileFormat, Error,>
{
    let tag = match serde_yaml::from_str::<Value,>(content,) {
        Ok(Value::Mapping(mapping,),) => mapping.get(FORMAT_KEY,).cloned(),
        _ => None,
    };
    match tag {
        None | Some(Value::Null,) => Ok(FileFormat::LATEST,),
        Some(Value::Number(number,),) => match number.as_f64() {
            Some(value,) => FileFormat::from_tag(value,),
            None => Err(unsupported(number,),),
        },
        Some(Value::String(text,),) => text.parse(),
        Some(other,) => Err(unsupported(format!("{other:?}"),),),
    }
}

fn trim_strings(value: Value,) -> Value
{
    match value {
        Value::String(text,) => Value::String(text.trim().to_string(),),
        Value::Sequence(items,) => Value::Sequence(items.into_iter().map(trim_strings,).collect(),),
        Value::Mapping(mapping,) => {
            Value::Mapping(mapping.into_iter().map(|(key, item,)| (key, trim_strings(item,),),).collect(),)
        }
        other => other,
    }
}

/// Turns `libraries: {group: [entry, ...]}` into one list, tagging each
/// mapping entry with `tags: [group]`. Groups that are not lists are dropped.
fn flatten_libraries<F,>(value: Value, mut per_library: F,) -> Value
where
    F: FnMut(&mut Mapping,),
{
    let mut document = match value {
        Value::Mapping(document,) => document,
        other => return other,
    };

    if let Some(slot,) = document.get_mut(LIBRARIES_KEY,)
        && let Value::Mapping(groups,) = slot
    {
        let groups = std::mem::take(groups,);
        let mut flattened = Vec::new();
        for (group, libraries,) in groups {
            let Value::Sequence(libraries,) = libraries else {
                continue;
            };
            for library in libraries {
                match library {
                    Value::Mapping(mut entry,) => {
                        entry.insert(Value::from("tags",), Value::Sequence(vec![group.clone()],),);
                        per_library(&mut entry,);
                        flattened.push(Value::Mapping(entry,),);
                    }
                    other => flattened.push(other,),
                }
            }
        }
        *slot = Value::Sequence(flattened,);
    }

    Value::Mapping(document,)
}

/// `target_versions: {javaagent: [...], library: [...]}` becomes
/// `javaagent_target_versions` and `library_target_versions`.
fn split_target_versions(library: &mut Mapping,)
{
    if !library.get(TARGET_VERSIONS_KEY,).is_some_and(Value::is_mapping,) {
        return;
    }
    let Some(Value::Mapping(targets,),) = library.shift_remove(TARGET_VERSIONS_KEY,) else {
        return;
    };
    for (kind, versions,) in targets {
        if let Some(kind,) = kind.as_str() {
            library.insert(Value::from(format!("{kind}_{TARGET_VERSIONS_KEY}"),), versions,);
        }
    }
}
