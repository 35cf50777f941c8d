// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Metadata quality findings collected while generating documentation.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

use crate::{
    component::{ComponentType, Distribution},
    merge::{MergedComponent, MergedInventory},
};

/// Kind of metadata gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind
{
    /// No `metadata.yaml` content at all.
    MissingMetadata,
    /// Metadata without a `status` block.
    MissingStatus,
    /// Status without stability levels.
    MissingStability,
}

impl IssueKind
{
    /// Machine name (`missing_status`).
    pub const fn as_str(self,) -> &'static str
    {
        match self {
            Self::MissingMetadata => "missing_metadata",
            Self::MissingStatus => "missing_status",
            Self::MissingStability => "missing_stability",
        }
    }

    /// Heading form (`Missing Status`).
    pub const fn title(self,) -> &'static str
    {
        match self {
            Self::MissingMetadata => "Missing Metadata",
            Self::MissingStatus => "Missing Status",
            Self::MissingStability => "Missing Stability",
        }
    }

    const fn details(self,) -> &'static str
    {
        match self {
            Self::MissingMetadata => "Component has no metadata field",
            Self::MissingStatus => "Component metadata has no status field",
            Self::MissingStability => "Component status has no stability field",
        }
    }
}

impl fmt::Display for IssueKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.as_str(),)
    }
}

/// One finding for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct ComponentIssue
{
    /// Component name.
    pub name:           String,
    /// Component category.
    pub component_type: ComponentType,
    /// Repository holding the component.
    pub source_repo:    Distribution,
    /// Kind of gap.
    pub kind:           IssueKind,
    /// Human readable explanation.
    pub details:        String,
}

/// Collected findings in recording order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize,)]
pub struct MetadataDiagnostics
{
    issues: Vec<ComponentIssue,>,
}

impl MetadataDiagnostics
{
    /// Inspects every merged component and records its first gap, if any.
    pub fn inspect(inventory: &MergedInventory,) -> Self
    {
        let mut diagnostics = Self::default();
        for (kind, components,) in &inventory.components {
            for component in components {
                match &component.metadata {
                    None => diagnostics.record(component, *kind, IssueKind::MissingMetadata,),
                    Some(metadata,) => match &metadata.status {
                        None => diagnostics.record(component, *kind, IssueKind::MissingStatus,),
                        Some(status,) if !status.has_stability() => {
                            diagnostics.record(component, *kind, IssueKind::MissingStability,)
                        }
                        Some(_,) => {}
                    },
                }
            }
        }
        diagnostics
    }

    /// Records a finding for `component`.
    pub fn record(&mut self, component: &MergedComponent, component_type: ComponentType, kind: IssueKind,)
    {
        self.issues.push(ComponentIssue {
            name: component.name.clone(),
            component_type,
            source_repo: component.source_repo,
            kind,
            details: kind.details().to_string(),
        },);
    }

    /// Findings in recording order.
    pub fn issues(&self,) -> &[ComponentIssue]
    {
        &self.issues
    }

    /// Returns true when anything was recorded.
    pub fn has_issues(&self,) -> bool
    {
        !self.issues.is_empty()
    }

    /// Number of findings.
    pub fn issue_count(&self,) -> usize
    {
        self.issues.len()
    }

    /// Findings grouped by kind.
    pub fn issues_by_kind(&self,) -> BTreeMap<IssueKind, Vec<&ComponentIssue,>,>
    {
        let mut grouped: BTreeMap<IssueKind, Vec<&ComponentIssue,>,> = BTreeMap::new();
        for issue in &self.issues {
            grouped.entry(issue.kind,).or_default().push(issue,);
        }
        grouped
    }

    /// Findings grouped by component category.
    pub fn issues_by_component_type(&self,) -> BTreeMap<ComponentType, Vec<&ComponentIssue,>,>
    {
        let mut grouped: BTreeMap<ComponentType, Vec<&ComponentIssue,>,> = BTreeMap::new();
        for issue in &self.issues {
            grouped.entry(issue.component_type,).or_default().push(issue,);
        }
        grouped
    }

    /// Markdown summary for logs.
    pub fn summary(&self,) -> String
    {
        if !self.has_issues() {
            return "✅ No metadata issues found - all components have complete metadata".to_string();
        }

        let mut lines = vec![format!("⚠️  Found {} metadata issue(s)\n", self.issue_count()), "## Issues by Type\n".to_string()];
        for (kind, mut issues,) in self.issues_by_kind() {
            lines.push(format!("### {} ({})\n", kind.title(), issues.len()),);
            issues.sort_by(|left, right| {
                (left.component_type, &left.name,).cmp(&(right.component_type, &right.name,),)
            },);
            for issue in issues {
                lines.push(format!(
                    "- **{}/{}** ({}): {}",
                    issue.component_type, issue.name, issue.source_repo, issue.details
                ),);
            }
            lines.push(String::new(),);
        }
        lines.join("\n",)
    }

    /// Markdown body for a tracking issue; empty when nothing was recorded.
    pub fn github_issue_body(&self,) -> String
    {
        if !self.has_issues() {
            return String::new();
        }

        let mut lines = vec![
            "## Summary\n".to_string(),
            format!(
                "The documentation sync process found **{} components** with missing or incomplete \
                 metadata. These components will display incomplete information in the \
                 documentation tables (showing `-` or `N/A`).\n",
                self.issue_count()
            ),
            "## Issue Breakdown\n".to_string(),
        ];
        for (kind, issues,) in self.issues_by_kind() {
            lines.push(format!("- **{}**: {} components", kind.title(), issues.len()),);
        }
        lines.push(String::new(),);

        lines.push("## Affected Components\n".to_string(),);
        for (component_type, mut issues,) in self.issues_by_component_type() {
            lines.push(format!("### {} ({} issues)\n", capitalize(component_type.as_str(),), issues.len()),);
            lines.push("| Component | Source | Issue | Details |".to_string(),);
            lines.push("|-----------|--------|-------|---------|".to_string(),);
            issues.sort_by(|left, right| left.name.cmp(&right.name,),);
            for issue in issues {
                lines.push(format!(
                    "| `{}` | {} | {} | {} |",
                    issue.name, issue.source_repo, issue.kind, issue.details
                ),);
            }
            lines.push(String::new(),);
        }

        lines.extend(
            [
                "## Action Required\n",
                "Please review the affected components and ensure their metadata files include:",
                "1. `metadata` field",
                "2. `metadata.status` field",
                "3. `metadata.status.stability` field with appropriate signal levels",
                "",
                "---",
                "*This issue was automatically generated by the documentation sync process.*",
            ]
            .map(str::to_string,),
        );
        lines.join("\n",)
    }
}

fn capitalize(word: &str,) -> String
{
    let mut chars = word.chars();
    match chars.next() {
        Some(first,) => first.to_uppercase().chain(chars,).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests
{
    use std::collections::BTreeMap;

    use super::*;
    use crate::metadata::{NormalizedMetadata, Status};

    fn component(name: &str, metadata: Option<NormalizedMetadata,>,) -> MergedComponent
    {
        MergedComponent {
            name: name.to_string(),
            subtype: None,
            source_repo: Distribution::Contrib,
            has_metadata: metadata.is_some(),
            metadata,
        }
    }

    fn inventory() -> MergedInventory
    {
        let stable = NormalizedMetadata {
            status: Some(Status {
                stability: Some(BTreeMap::from([("beta".to_string(), vec!["traces".to_string()],)],),),
                ..Status::default()
            },),
            ..NormalizedMetadata::default()
        };
        let no_stability = NormalizedMetadata {
            status: Some(Status::default(),),
            ..NormalizedMetadata::default()
        };
        MergedInventory {
            components: BTreeMap::from([
                (
                    ComponentType::Receiver,
                    vec![
                        component("zipkin", Some(stable,),),
                        component("nop", None,),
                        component("kafka", Some(NormalizedMetadata::default(),),),
                    ],
                ),
                (ComponentType::Exporter, vec![component("file", Some(no_stability,),)],),
            ],),
        }
    }

    #[test]
    fn inspect_records_first_gap_per_component()
    {
        let diagnostics = MetadataDiagnostics::inspect(&inventory(),);
        let kinds: Vec<(&str, IssueKind,),> =
            diagnostics.issues().iter().map(|issue| (issue.name.as_str(), issue.kind,),).collect();
        assert_eq!(
            kinds,
            [
                ("file", IssueKind::MissingStability,),
                ("nop", IssueKind::MissingMetadata,),
                ("kafka", IssueKind::MissingStatus,),
            ]
        );
        assert_eq!(diagnostics.issues_by_component_type()[&ComponentType::Receiver].len(), 2);
    }

    #[test]
    fn summary_groups_by_kind()
    {
        let summary = MetadataDiagnostics::inspect(&inventory(),).summary();
        assert!(summary.starts_with("⚠️  Found 3 metadata issue(s)\n"));
        assert!(summary.contains("### Missing Metadata (1)\n"));
        assert!(summary.contains("- **receiver/nop** (contrib): Component has no metadata field"));
    }

    #[test]
    fn issue_body_lists_components_per_type()
    {
        let body = MetadataDiagnostics::inspect(&inventory(),).github_issue_body();
        assert!(body.contains("found **3 components**"));
        assert!(body.contains("### Receiver (2 issues)\n"));
        assert!(body.contains("| `kafka` | contrib | missing_status | Component metadata has no status field |"));
        assert!(body.ends_with("*This issue was automatically generated by the documentation sync process.*"));
    }

    #[test]
    fn clean_inventory_has_no_issues()
    {
        let diagnostics = MetadataDiagnostics::inspect(&MergedInventory::default(),);
        assert!(!diagnostics.has_issues());
        assert!(diagnostics.github_issue_body().is_empty());
        assert!(diagnostics.summary().starts_with("✅"));
    }
}
