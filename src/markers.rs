// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Rewrites marker-delimited sections of Markdown pages.
//!
//! A section looks like:
//!
//! ```text
//! <!-- BEGIN GENERATED: receiver-table SOURCE: open-telemetry/opentelemetry-ecosystem-explorer -->
//! ...
//! <!-- END GENERATED: receiver-table SOURCE: open-telemetry/opentelemetry-ecosystem-explorer -->
//! ```
//!
//! The `SOURCE:` part is optional when matching and always written back.

use std::{collections::BTreeMap, fs, path::Path};

use regex::{NoExpand, Regex};
use tracing::{debug, info};

use crate::error::{Error, io_error};

/// Default marker prefix.
pub const DEFAULT_MARKER_PREFIX: &str = "GENERATED";
/// Default marker source.
pub const DEFAULT_MARKER_SOURCE: &str = "open-telemetry/opentelemetry-ecosystem-explorer";

const SOURCE_PATTERN: &str = r"(?:\s+SOURCE:\s+[\w\-/.]+)?";

/// Replaces generated sections in documentation content.
#[derive(Debug, Clone)]
pub struct DocMarkerUpdater {
    marker_prefix: String,
    source:        String
}

impl Default for DocMarkerUpdater {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_PREFIX, DEFAULT_MARKER_SOURCE)
    }
}

impl DocMarkerUpdater {
    /// Creates an updater writing `<!-- BEGIN {prefix}: id SOURCE: {source} -->`.
    pub fn new(marker_prefix: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            marker_prefix: marker_prefix.into(),
            source:        source.into()
        }
    }

    /// Begin and end markers written for `marker_id`.
    pub fn markers(&self, marker_id: &str) -> (String, String) {
        (
            format!(
                "<!-- BEGIN {}: {marker_id} SOURCE: {} -->",
                self.marker_prefix, self.source
            ),
            format!(
                "<!-- END {}: {marker_id} SOURCE: {} -->",
                self.marker_prefix, self.source
            )
        )
    }

    fn section_regex(&self, marker_id: &str) -> Result<Regex, Error> {
        let boundary = |kind: &str| {
            format!(
                "{}{SOURCE_PATTERN}{}",
                regex::escape(&format!("<!-- {kind} {}: {marker_id}", self.marker_prefix)),
                regex::escape(" -->")
            )
        };
        let pattern = format!("{}(?s:.*?){}", boundary("BEGIN"), boundary("END"));
        Regex::new(&pattern)
            .map_err(|e| Error::validation(format!("invalid marker pattern for {marker_id}: {e}")))
    }

    /// Replaces every section marked `marker_id`, markers included, with
    /// `new_content` wrapped in freshly written markers.
    ///
    /// Returns the content unchanged and `false` when no section exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the marker id produces an invalid
    /// pattern.
    ///
    /// # Example
    ///
    /// ```
    /// use ecosystem_automation::DocMarkerUpdater;
    ///
    /// let page = "<!-- BEGIN GENERATED: t -->\nold\n<!-- END GENERATED: t -->\n";
    /// let (updated, found) = DocMarkerUpdater::default().update_section(page, "t", "new")?;
    /// assert!(found);
    /// assert!(updated.contains("\nnew\n"));
    /// # Ok::<(), ecosystem_automation::Error>(())
    /// ```
    pub fn update_section(
        &self,
        content: &str,
        marker_id: &str,
        new_content: &str
    ) -> Result<(String, bool), Error> {
        let regex = self.section_regex(marker_id)?;
        if !regex.is_match(content) {
            debug!("Marker {marker_id} not found");
            return Ok((content.to_string(), false));
        }

        let (begin, end) = self.markers(marker_id);
        let replacement = format!("{begin}\n{new_content}\n{end}");
        let updated = regex.replace_all(content, NoExpand(&replacement));
        Ok((updated.into_owned(), true))
    }

    /// Applies several updates in turn, reporting per marker whether it was
    /// found.
    ///
    /// # Errors
    ///
    /// Propagates [`DocMarkerUpdater::update_section`] failures.
    pub fn update_multiple_sections(
        &self,
        content: &str,
        updates: &BTreeMap<String, String>
    ) -> Result<(String, BTreeMap<String, bool>), Error> {
        let mut current = content.to_string();
        let mut results = BTreeMap::new();
        for (marker_id, new_content) in updates {
            let (updated, found) = self.update_section(&current, marker_id, new_content)?;
            current = updated;
            results.insert(marker_id.clone(), found);
        }
        Ok((current, results))
    }

    /// Updates one section of the file at `path`.
    ///
    /// Returns `false` when the marker is missing. The file is rewritten
    /// only when its content changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read or written,
    /// including when it does not exist.
    pub fn update_file(
        &self,
        path: &Path,
        marker_id: &str,
        new_content: &str
    ) -> Result<bool, Error> {
        let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let (updated, found) = self.update_section(&content, marker_id, new_content)?;
        if !found {
            return Ok(false);
        }

        if updated != content {
            info!("Writing {marker_id} to {}", path.display());
            fs::write(path, updated).map_err(|e| io_error(path, e))?;
        } else {
            debug!("No changes for {marker_id} in {}", path.display());
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    const PAGE: &str = "# Test Page\n\nThis is some manual content.\n\n<!-- BEGIN GENERATED: test-section -->\nOld generated content here\n<!-- END GENERATED: test-section -->\n\nMore manual content below.\n";

    #[test]
    fn replaces_section_and_adds_source() {
        let (updated, found) = DocMarkerUpdater::default()
            .update_section(PAGE, "test-section", "New generated content")
            .expect("update failed");

        assert!(found);
        assert!(updated.contains(
            "<!-- BEGIN GENERATED: test-section SOURCE: open-telemetry/opentelemetry-ecosystem-explorer -->\nNew generated content\n<!-- END GENERATED: test-section SOURCE: open-telemetry/opentelemetry-ecosystem-explorer -->"
        ));
        assert!(!updated.contains("Old generated content here"));
        assert!(updated.starts_with("# Test Page\n\nThis is some manual content.\n\n"));
        assert!(updated.ends_with("\n\nMore manual content below.\n"));
    }

    #[test]
    fn existing_source_is_matched_and_rewritten_once() {
        let updater = DocMarkerUpdater::default();
        let (first, _) = updater
            .update_section(PAGE, "test-section", "v1")
            .expect("first update failed");
        let (second, found) = updater
            .update_section(&first, "test-section", "v2")
            .expect("second update failed");

        assert!(found);
        assert_eq!(second.matches("BEGIN GENERATED").count(), 1);
        assert!(second.contains("\nv2\n"));
        assert!(!second.contains("v1"));
    }

    #[test]
    fn missing_marker_leaves_content_untouched() {
        let content = "# Simple Page\n\nNo markers here.";
        let (updated, found) = DocMarkerUpdater::default()
            .update_section(content, "nonexistent", "New content")
            .expect("update failed");

        assert!(!found);
        assert_eq!(updated, content);
    }

    #[test]
    fn replacement_text_is_literal() {
        let (updated, _) = DocMarkerUpdater::default()
            .update_section(PAGE, "test-section", "costs $1 and ${name}")
            .expect("update failed");
        assert!(updated.contains("\ncosts $1 and ${name}\n"));
    }

    #[test]
    fn marker_ids_do_not_match_prefixes_of_each_other() {
        let content = "<!-- BEGIN GENERATED: extension-table -->\nold\n<!-- END GENERATED: extension-table -->\n";
        let (_, found) = DocMarkerUpdater::default()
            .update_section(content, "extension", "new")
            .expect("update failed");
        assert!(!found);
    }

    #[test]
    fn multiple_sections_report_each_marker() {
        let content = "<!-- BEGIN GENERATED: a -->\n1\n<!-- END GENERATED: a -->\n<!-- BEGIN GENERATED: b -->\n2\n<!-- END GENERATED: b -->\n";
        let updates = BTreeMap::from([
            ("a".to_string(), "one".to_string()),
            ("c".to_string(), "three".to_string())
        ]);
        let (updated, results) = DocMarkerUpdater::default()
            .update_multiple_sections(content, &updates)
            .expect("update failed");

        assert_eq!(results.get("a"), Some(&true));
        assert_eq!(results.get("c"), Some(&false));
        assert!(updated.contains("\none\n"));
        assert!(updated.contains("\n2\n"));
    }

    #[test]
    fn custom_prefix_and_source() {
        let updater = DocMarkerUpdater::new("AUTO", "example/repo");
        let content = "<!-- BEGIN AUTO: x -->\nold\n<!-- END AUTO: x -->";
        let (updated, found) = updater.update_section(content, "x", "new").expect("update failed");
        assert!(found);
        assert_eq!(
            updated,
            "<!-- BEGIN AUTO: x SOURCE: example/repo -->\nnew\n<!-- END AUTO: x SOURCE: example/repo -->"
        );
    }

    #[test]
    fn update_file_writes_only_when_marker_found() {
        let dir = tempdir().expect("failed to create tempdir");
        let path = dir.path().join("receiver.md");
        fs::write(&path, PAGE).expect("failed to write page");
        let updater = DocMarkerUpdater::default();

        assert!(updater.update_file(&path, "test-section", "fresh").expect("update failed"));
        assert!(fs::read_to_string(&path).expect("failed to read page").contains("\nfresh\n"));
        assert!(!updater.update_file(&path, "other", "fresh").expect("update failed"));

        let missing = updater.update_file(&dir.path().join("absent.md"), "test-section", "x");
        assert!(matches!(missing, Err(Error::Io { .. })));
    }
}
