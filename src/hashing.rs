// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Canonical normalization and content hashing of nested documents.
//!
//! Two documents that differ only in mapping key order hash identically;
//! sequence order is significant.

use std::{collections::BTreeMap, io};

use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::ser::Formatter;
use serde_yaml::Value;
use sha2::{Digest, Sha256};

use crate::error::Error;

/// Number of hex characters kept from the SHA-256 digest.
pub const HASH_LENGTH: usize = 12;

/// Document with every mapping key-sorted.
#[derive(Debug, Clone, PartialEq,)]
pub enum CanonicalValue
{
    /// Null scalar.
    Null,
    /// Boolean scalar.
    Bool(bool,),
    /// Numeric scalar.
    Number(serde_yaml::Number,),
    /// String scalar.
    String(String,),
    /// Sequence in original order.
    Sequence(Vec<CanonicalValue,>,),
    /// Mapping keyed by stringified keys in sorted order.
    Mapping(BTreeMap<String, CanonicalValue,>,),
}

/// Normalizes `value` into its canonical form.
///
/// Mapping keys are sorted recursively, sequences keep their order and scalars
/// pass through unchanged. Scalar keys are rendered the way JSON encoders
/// stringify them.
///
/// # Errors
///
/// Returns [`Error::UnsupportedValue`] for tagged YAML nodes, non-finite
/// numbers and mapping keys that are not scalars.
pub fn normalize(value: &Value,) -> Result<CanonicalValue, Error,>
{
    match value {
        Value::Null => Ok(CanonicalValue::Null,),
        Value::Bool(flag,) => Ok(CanonicalValue::Bool(*flag,),),
        Value::Number(number,) if !is_finite(number,) => Err(Error::UnsupportedValue {
            kind: format!("non-finite number {number}"),
        },),
        Value::Number(number,) => Ok(CanonicalValue::Number(number.clone(),),),
        Value::String(text,) => Ok(CanonicalValue::String(text.clone(),),),
        Value::Sequence(items,) => {
            items.iter().map(normalize,).collect::<Result<Vec<_,>, _,>>().map(CanonicalValue::Sequence,)
        }
        Value::Mapping(mapping,) => {
            let mut sorted = BTreeMap::new();
            for (key, item,) in mapping {
                sorted.insert(key_string(key,)?, normalize(item,)?,);
            }
            Ok(CanonicalValue::Mapping(sorted,),)
        }
        Value::Tagged(tagged,) => Err(Error::UnsupportedValue {
            kind: format!("tagged node {}", tagged.tag),
        },),
    }
}

fn key_string(key: &Value,) -> Result<String, Error,>
{
    match key {
        Value::String(text,) => Ok(text.clone(),),
        Value::Bool(flag,) => Ok(flag.to_string(),),
        Value::Number(number,) if !is_finite(number,) => Err(Error::UnsupportedValue {
            kind: format!("non-finite number {number} used as mapping key"),
        },),
        Value::Number(number,) => Ok(number_literal(number,),),
        Value::Null => Ok("null".to_string(),),
        Value::Sequence(_,) => Err(Error::UnsupportedValue {
            kind: "sequence used as mapping key".to_string(),
        },),
        Value::Mapping(_,) => Err(Error::UnsupportedValue {
            kind: "mapping used as mapping key".to_string(),
        },),
        Value::Tagged(tagged,) => Err(Error::UnsupportedValue {
            kind: format!("tagged node {} used as mapping key", tagged.tag),
        },),
    }
}

/// Computes the content hash of `value`: the first [`HASH_LENGTH`] lowercase
/// hex characters of the SHA-256 of its compact, key-sorted JSON encoding.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a top-level null and propagates
/// [`normalize`] failures.
///
/// # Example
///
/// ```
/// use ecosystem_automation::content_hash;
///
/// let left: serde_yaml::Value = serde_yaml::from_str("{name: kafka, tags: [a]}").unwrap();
/// let right: serde_yaml::Value = serde_yaml::from_str("{tags: [a], name: kafka}").unwrap();
/// assert_eq!(content_hash(&left).unwrap(), content_hash(&right).unwrap());
/// ```
pub fn content_hash(value: &Value,) -> Result<String, Error,>
{
    if value.is_null() {
        return Err(Error::validation("cannot hash a null value",),);
    }
    normalize(value,)?.digest()
}

impl CanonicalValue
{
    /// Minimal JSON encoding with sorted keys and ASCII-only output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] when serialization fails.
    pub fn to_canonical_json(&self,) -> Result<String, Error,>
    {
        let mut buffer = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, AsciiFormatter,);
        self.serialize(&mut serializer,)?;
        String::from_utf8(buffer,).map_err(|e| Error::validation(format!("canonical JSON is not UTF-8: {e}"),),)
    }

    /// Truncated SHA-256 of [`Self::to_canonical_json`].
    ///
    /// # Errors
    ///
    /// Propagates [`Self::to_canonical_json`] failures.
    pub fn digest(&self,) -> Result<String, Error,>
    {
        let mut hasher = Sha256::new();
        hasher.update(self.to_canonical_json()?.as_bytes(),);
        let hex = format!("{:x}", hasher.finalize());
        Ok(hex[..HASH_LENGTH].to_string(),)
    }
}

impl From<CanonicalValue,> for Value
{
    fn from(value: CanonicalValue,) -> Self
    {
        match value {
            CanonicalValue::Null => Value::Null,
            CanonicalValue::Bool(flag,) => Value::Bool(flag,),
            CanonicalValue::Number(number,) => Value::Number(number,),
            CanonicalValue::String(text,) => Value::String(text,),
            CanonicalValue::Sequence(items,) => {
                Value::Sequence(items.into_iter().map(Value::from,).collect(),)
            }
            CanonicalValue::Mapping(entries,) => Value::Mapping(
                entries.into_iter().map(|(key, item,)| (Value::String(key,), Value::from(item,),),).collect(),
            ),
        }
    }
}

impl Serialize for CanonicalValue
{
    fn serialize<S,>(&self, serializer: S,) -> Result<S::Ok, S::Error,>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(flag,) => serializer.serialize_bool(*flag,),
            Self::Number(number,) => number.serialize(serializer,),
            Self::String(text,) => serializer.serialize_str(text,),
            Self::Sequence(items,) => items.serialize(serializer,),
            Self::Mapping(entries,) => {
                let mut map = serializer.serialize_map(Some(entries.len(),),)?;
                for (key, item,) in entries {
                    map.serialize_entry(key, item,)?;
                }
                map.end()
            }
        }
    }
}

/// Compact JSON formatter escaping every non-ASCII character as `\uXXXX`
/// (UTF-16 surrogate pairs above the BMP) and printing floats in shortest
/// round-trip form with an explicit exponent sign (`1e+16`).
struct AsciiFormatter;

impl Formatter for AsciiFormatter
{
    fn write_string_fragment<W,>(&mut self, writer: &mut W, fragment: &str,) -> io::Result<(),>
    where
        W: ?Sized + io::Write,
    {
        for ch in fragment.chars() {
            if matches!(ch, ' '..='~') {
                writer.write_all(&[ch as u8],)?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units,) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok((),)
    }

    fn write_f64<W,>(&mut self, writer: &mut W, value: f64,) -> io::Result<(),>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_literal(value,).as_bytes(),)
    }
}

/// Shortest round-trip rendering of a finite float: positional with at least
/// one fractional digit for exponents in `-4..16`, scientific otherwise.
fn float_literal(value: f64,) -> String
{
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent,),) = scientific.split_once('e',) else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or_default();
    if (-4..16).contains(&exponent,) {
        let positional = value.to_string();
        if positional.contains('.',) { positional } else { format!("{positional}.0") }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
    }
}

fn is_finite(number: &serde_yaml::Number,) -> bool
{
    !(number.is_nan() || number.is_infinite())
}

fn number_literal(number: &serde_yaml::Number,) -> String
{
    if let Some(integer,) = number.as_i64() {
        return integer.to_string();
    }
    if let Some(integer,) = number.as_u64() {
        return integer.to_string();
    }
    number.as_f64().map_or_else(|| number.to_string(), float_literal,)
}
