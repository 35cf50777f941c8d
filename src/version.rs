// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Release versions of the form `v<major>.<minor>.<patch>[-SNAPSHOT]`.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Semantic version tracked by the inventories.
///
/// Ordering compares `(major, minor, patch)` numerically; at equal numbers a
/// prerelease (snapshot) sorts strictly below the release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash,)]
pub struct Version
{
    /// Major component.
    pub major:         u64,
    /// Minor component.
    pub minor:         u64,
    /// Patch component.
    pub patch:         u64,
    /// Whether the version carries the `-SNAPSHOT` suffix.
    pub is_prerelease: bool,
}

impl Version
{
    /// Creates a release version.
    pub const fn new(major: u64, minor: u64, patch: u64,) -> Self
    {
        Self {
            major, minor, patch, is_prerelease: false,
        }
    }

    /// Parses `[v]MAJOR.MINOR.PATCH[-SNAPSHOT]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] for missing or extra segments,
    /// non-numeric parts and any suffix other than `-SNAPSHOT`.
    pub fn parse(input: &str,) -> Result<Self, Error,>
    {
        let invalid = || Error::InvalidVersion {
            input: input.to_string(),
        };

        let body = input.strip_prefix('v',).unwrap_or(input,);
        let (numbers, is_prerelease,) = match body.strip_suffix(SNAPSHOT_SUFFIX,) {
            Some(numbers,) => (numbers, true,),
            None => (body, false,),
        };

        let mut parts = numbers.split('.',);
        let mut next_number = || -> Result<u64, Error,> {
            let part = parts.next().ok_or_else(invalid,)?;
            if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit(),) {
                return Err(invalid(),);
            }
            part.parse::<u64>().map_err(|_| invalid(),)
        };

        let major = next_number()?;
        let minor = next_number()?;
        let patch = next_number()?;
        if parts.next().is_some() {
            return Err(invalid(),);
        }

        Ok(Self {
            major, minor, patch, is_prerelease,
        },)
    }

    /// Returns the next patch release: patch + 1 with the prerelease flag
    /// cleared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] when the patch number is already at
    /// its maximum.
    pub fn next_patch(&self,) -> Result<Self, Error,>
    {
        let patch = self.patch.checked_add(1,).ok_or_else(|| Error::InvalidVersion {
            input: self.to_string(),
        },)?;
        Ok(Self::new(self.major, self.minor, patch,),)
    }

    /// Returns the same numbers marked as a snapshot.
    pub const fn as_snapshot(&self,) -> Self
    {
        Self {
            major:         self.major,
            minor:         self.minor,
            patch:         self.patch,
            is_prerelease: true,
        }
    }

    /// Version string without the leading `v`, as stored inside inventory
    /// files and explorer indexes (`0.112.0`, `0.113.0-SNAPSHOT`).
    pub fn number(&self,) -> String
    {
        let suffix = if self.is_prerelease { SNAPSHOT_SUFFIX } else { "" };
        format!("{}.{}.{}{suffix}", self.major, self.minor, self.patch)
    }
}

impl fmt::Display for Version
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        write!(f, "v{}", self.number())
    }
}

impl FromStr for Version
{
    type Err = Error;

    fn from_str(s: &str,) -> Result<Self, Self::Err,>
    {
        Self::parse(s,)
    }
}

impl Ord for Version
{
    fn cmp(&self, other: &Self,) -> Ordering
    {
        (self.major, self.minor, self.patch,)
            .cmp(&(other.major, other.minor, other.patch,),)
            .then_with(|| other.is_prerelease.cmp(&self.is_prerelease,),)
    }
}

impl PartialOrd for Version
{
    fn partial_cmp(&self, other: &Self,) -> Option<Ordering,>
    {
        Some(self.cmp(other,),)
    }
}

impl Serialize for Version
{
    fn serialize<S,>(&self, serializer: S,) -> Result<S::Ok, S::Error,>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.number(),)
    }
}

impl<'de,> Deserialize<'de,> for Version
{
    fn deserialize<D,>(deserializer: D,) -> Result<Self, D::Error,>
    where
        D: Deserializer<'de,>,
    {
        let raw = String::deserialize(deserializer,)?;
        Self::parse(&raw,).map_err(serde::de::Error::custom,)
    }
}

/// Sorts versions newest first.
pub fn sort_newest_first(versions: &mut [Version],)
{
    versions.sort_by(|left, right| right.cmp(left,),);
}

#[cfg(test)]
mod tests
{
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn parse_display_round_trip(major in 0u64..10_000, minor in 0u64..10_000, patch in 0u64..10_000, snapshot in any::<bool>()) {
            let text = format!("{major}.{minor}.{patch}{}", if snapshot { "-SNAPSHOT" } else { "" });
            let parsed = Version::parse(&text).expect("generated version parses");
            prop_assert_eq!(parsed.to_string(), format!("v{text}"));
            prop_assert_eq!(Version::parse(&parsed.to_string()).expect("canonical form parses"), parsed);
        }

        #[test]
        fn snapshot_sorts_below_release(major in 0u64..100, minor in 0u64..100, patch in 0u64..100) {
            let release = Version::new(major, minor, patch);
            prop_assert!(release.as_snapshot() < release);
            prop_assert!(release < release.next_patch().expect("patch fits").as_snapshot());
        }
    }

    #[test]
    fn parses_optional_prefix_and_snapshot()
    {
        let version = Version::parse("v0.112.0",).expect("valid version",);
        assert_eq!(version, Version::new(0, 112, 0));

        let snapshot = Version::parse("1.2.3-SNAPSHOT",).expect("valid snapshot",);
        assert!(snapshot.is_prerelease);
        assert_eq!(snapshot.to_string(), "v1.2.3-SNAPSHOT");
        assert_eq!(snapshot.number(), "1.2.3-SNAPSHOT");
    }

    #[test]
    fn rejects_malformed_versions()
    {
        for input in [
            "", "v", "1.2", "1.2.3.4", "1..3", "a.b.c", "1.2.3-rc1", "1.2.3-snapshot", "vv1.2.3",
            "+1.2.3", "1.2.3 ", "1.2.-3",
        ] {
            let error = Version::parse(input,).expect_err("input must be rejected",);
            assert!(matches!(error, Error::InvalidVersion { .. }), "{input}");
        }
    }

    #[test]
    fn ordering_is_numeric_not_lexicographic()
    {
        let mut versions = vec![
            Version::parse("v0.9.0",).expect("valid",),
            Version::parse("v0.112.0",).expect("valid",),
            Version::parse("v0.112.1-SNAPSHOT",).expect("valid",),
            Version::parse("v0.112.1",).expect("valid",),
        ];
        sort_newest_first(&mut versions,);
        let rendered: Vec<String,> = versions.iter().map(ToString::to_string,).collect();
        assert_eq!(rendered, ["v0.112.1", "v0.112.1-SNAPSHOT", "v0.112.0", "v0.9.0"]);
    }

    #[test]
    fn next_patch_clears_prerelease()
    {
        let snapshot = Version::parse("v1.4.2-SNAPSHOT",).expect("valid",);
        let next = snapshot.next_patch().expect("patch fits",);
        assert_eq!(next.to_string(), "v1.4.3");
        assert!(!next.is_prerelease);
    }

    #[test]
    fn next_patch_rejects_overflow()
    {
        let version = Version::parse("v1.2.18446744073709551615",).expect("valid",);
        let error = version.next_patch().expect_err("patch overflow",);
        assert!(matches!(error, Error::InvalidVersion { ref input } if input == "v1.2.18446744073709551615"));
    }

    #[test]
    fn serde_uses_bare_number()
    {
        let version = Version::parse("v2.10.0",).expect("valid",);
        let yaml = serde_yaml::to_string(&version,).expect("serializes",);
        assert_eq!(yaml.trim(), "2.10.0");
        let back: Version = serde_yaml::from_str("v2.10.0",).expect("deserializes",);
        assert_eq!(back, version);
    }
}
