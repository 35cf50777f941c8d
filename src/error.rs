#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the automation crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint, so the lint is disabled
//! for this module.

use std::path::{Path, PathBuf};

/// Unified error type returned by the parsers, inventories and CLI.
///
/// Metadata files are the one input that never surfaces here: an unreadable or
/// malformed `metadata.yaml` degrades to "no metadata" instead.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors together with the path that failed.
    #[error("failed to access {path:?}: {source}")]
    Io {
        /// File or directory being accessed.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding and encoding errors.
    #[error("failed to process YAML: {source}")]
    Yaml {
        /// Source error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Wraps JSON encoding errors.
    #[error("failed to serialize JSON: {source}")]
    Json {
        /// Source error from serde_json.
        source: serde_json::Error
    },
    /// Returned when input violates a structural invariant.
    #[error("invalid input: {message}")]
    Validation {
        /// Human readable message describing the violation.
        message: String
    },
    /// Returned when a version string is not `[v]MAJOR.MINOR.PATCH[-SNAPSHOT]`.
    #[error("invalid version string: {input:?}")]
    InvalidVersion {
        /// Rejected input.
        input: String
    },
    /// Returned for an instrumentation `file_format` tag outside the known set.
    #[error("unsupported file_format: {format}. Supported versions: {supported}")]
    UnsupportedFormat {
        /// Tag found in the document or requested by the caller.
        format:    String,
        /// Comma separated list of known tags.
        supported: String
    },
    /// Returned when a value cannot take part in content hashing.
    #[error("cannot normalize value of type {kind}")]
    UnsupportedValue {
        /// Description of the offending value kind.
        kind: String
    },
    /// Returned when an external command exits unsuccessfully.
    #[error("command `{command}` failed: {message}")]
    Command {
        /// Command line that was executed.
        command: String,
        /// Captured diagnostic output.
        message: String
    },
    /// Service errors when interacting with external APIs.
    #[error("service error: {message}")]
    Service {
        /// Human readable message describing the service error.
        message: String
    }
}

impl Error {
    /// Constructs a validation error from the provided message.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a service error from the provided message.
    pub fn service<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Service {
            message: message.into()
        }
    }

    /// Constructs a command failure for `command` with captured `message`.
    pub fn command<C, M>(command: C, message: M) -> Self
    where
        C: Into<String>,
        M: Into<String>
    {
        Self::Command {
            command: command.into(),
            message: message.into()
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation and
    /// is what the CLI prints before exiting.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Yaml {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn validation_constructor_populates_message() {
        let error = Error::validation("no libraries");
        match error {
            Error::Validation {
                ref message
            } => {
                assert_eq!(message, "no libraries");
            }
            other => panic!("expected validation error, got {other:?}")
        }
    }

    #[test]
    fn to_display_string_matches_display() {
        let error = Error::validation("display me");
        assert_eq!(error.to_string(), error.to_display_string());
    }

    #[test]
    fn io_error_helper_wraps_path_and_source() {
        let path = std::path::Path::new("/tmp/inventory/core");
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = super::io_error(path, io_error);

        match error {
            Error::Io {
                path: ref stored_path,
                ref source
            } => {
                assert_eq!(stored_path, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected io error, got {other:?}")
        }
    }

    #[test]
    fn unsupported_format_names_supported_set() {
        let error = Error::UnsupportedFormat {
            format:    "0.9".to_string(),
            supported: "0.1, 0.2".to_string()
        };
        assert_eq!(
            error.to_string(),
            "unsupported file_format: 0.9. Supported versions: 0.1, 0.2"
        );
    }

    #[test]
    fn serde_yaml_conversion_maps_to_yaml_variant() {
        let error = serde_yaml::from_str::<usize>("not-a-number").unwrap_err();
        let mapped: Error = error.into();
        assert!(matches!(mapped, Error::Yaml { .. }));
    }

    #[test]
    fn serde_json_conversion_maps_to_json_variant() {
        let invalid = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();
        let mapped: Error = invalid.into();
        assert!(matches!(mapped, Error::Json { .. }));
    }

    #[test]
    fn command_constructor_keeps_command_line() {
        let error = Error::command("git checkout v1.0.0", "pathspec did not match");
        assert!(error.to_string().contains("git checkout v1.0.0"));
    }
}
