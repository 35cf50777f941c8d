// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Markdown component tables for the collector documentation pages.
//!
//! Tables are keyed by marker id stem: one per category, plus separate
//! extension subtype tables and a shared extension footnote block.

use std::collections::BTreeMap;

use crate::{
    component::{ComponentType, Distribution, ExtensionSubtype},
    merge::{MergedComponent, MergedInventory},
};

const GITHUB_ORG_URL: &str = "https://github.com/open-telemetry";
const STABILITY_DOC_URL: &str =
    "https://github.com/open-telemetry/opentelemetry-collector/blob/main/docs/component-stability.md";
const UNMAINTAINED_LEVEL: &str = "unmaintained";

/// Table key holding the extension footnotes.
pub const EXTENSION_FOOTNOTES_KEY: &str = "extension-footnotes";

/// Renders component tables.
#[derive(Debug, Clone, Copy, Default,)]
pub struct DocContentGenerator;

impl DocContentGenerator
{
    /// Renders every table of `inventory`.
    ///
    /// Keys: `receiver`, `processor`, `exporter`, `connector`, `extension`,
    /// `extension-<subtype>` for every non-empty subtype and
    /// [`EXTENSION_FOOTNOTES_KEY`]. Extension tables omit their footnotes,
    /// which are rendered once for the whole page.
    pub fn generate_all_tables(&self, inventory: &MergedInventory,) -> BTreeMap<String, String,>
    {
        let empty = Vec::new();
        let components_of = |kind: ComponentType| inventory.components.get(&kind,).unwrap_or(&empty,);

        let mut tables = BTreeMap::new();
        for kind in [
            ComponentType::Receiver,
            ComponentType::Processor,
            ComponentType::Exporter,
            ComponentType::Connector,
        ] {
            tables.insert(kind.as_str().to_string(), self.generate_table(kind, components_of(kind,), None, true,),);
        }

        let extensions = components_of(ComponentType::Extension,);
        tables.insert(
            ComponentType::Extension.as_str().to_string(),
            self.generate_table(ComponentType::Extension, extensions, None, false,),
        );
        for subtype in ExtensionSubtype::ALL {
            if extensions.iter().any(|component| component.subtype == Some(subtype,),) {
                tables.insert(
                    format!("extension-{subtype}"),
                    self.generate_table(ComponentType::Extension, extensions, Some(subtype,), false,),
                );
            }
        }
        tables.insert(EXTENSION_FOOTNOTES_KEY.to_string(), footnotes(ComponentType::Extension,),);
        tables
    }

    /// Renders one table of the components whose subtype equals `subtype`,
    /// sorted by name.
    pub fn generate_table(
        &self,
        kind: ComponentType,
        components: &[MergedComponent],
        subtype: Option<ExtensionSubtype,>,
        include_footnotes: bool,
    ) -> String
    {
        let mut selected: Vec<&MergedComponent,> =
            components.iter().filter(|component| component.subtype == subtype,).collect();
        selected.sort_by(|left, right| left.name.cmp(&right.name,),);

        let mut table = String::from(match kind {
            ComponentType::Extension => {
                "| Name | Distributions[^1] | Stability[^2] |\n|------|-------------------|---------------|\n"
            }
            ComponentType::Connector => "| Name | Distributions[^1] |\n|------|-------------------|\n",
            _ => {
                "| Name | Distributions[^1] | Traces[^2] | Metrics[^2] | Logs[^2] |\n\
                 |------|-------------------|------------|-------------|----------|\n"
            }
        },);

        for component in selected {
            let name = name_link(kind, component, subtype,);
            let distributions = format_distributions(component,);
            let stability = |signal: &str, missing: &'static str| {
                component.status().and_then(|status| status.stability_for(signal,),).unwrap_or(missing,).to_string()
            };
            let row = match kind {
                ComponentType::Extension => {
                    format!("| {name} | {distributions} | {} |\n", stability("extension", "N/A",))
                }
                ComponentType::Connector => format!("| {name} | {distributions} |\n"),
                _ => format!(
                    "| {name} | {distributions} | {} | {} | {} |\n",
                    stability("traces", "-",),
                    stability("metrics", "-",),
                    stability("logs", "-",)
                ),
            };
            table.push_str(&row,);
        }

        if include_footnotes {
            table.push('\n',);
            table.push_str(&footnotes(kind,),);
        }
        table
    }
}

/// Footnote definitions referenced by the table headers.
pub fn footnotes(kind: ComponentType,) -> String
{
    let mut text = String::from(
        "[^1]:\n    Shows which [distributions](/docs/collector/distributions/) (core, contrib,\n    K8s, \
         etc.) include this component.\n",
    );
    if kind != ComponentType::Connector {
        text.push_str("\n[^2]:\n    For details about component stability levels, see the\n",);
        text.push_str(&format!(
            "    [OpenTelemetry Collector component stability definitions]({STABILITY_DOC_URL}).\n"
        ),);
    }
    text
}

fn name_link(kind: ComponentType, component: &MergedComponent, subtype: Option<ExtensionSubtype,>,) -> String
{
    let repository = component.source_repo.repository_name();
    let path = match subtype {
        Some(subtype,) => format!("{kind}/{subtype}/{}", component.name),
        None => format!("{kind}/{}", component.name),
    };
    let mut link = format!("[{}]({GITHUB_ORG_URL}/{repository}/tree/main/{path})", component.name);
    if kind != ComponentType::Connector && is_unmaintained(component,) {
        link.push_str(" ⚠️",);
    }
    link
}

fn is_unmaintained(component: &MergedComponent,) -> bool
{
    component
        .status()
        .and_then(|status| status.stability.as_ref(),)
        .is_some_and(|levels| levels.contains_key(UNMAINTAINED_LEVEL,),)
}

/// Sorted distributions, `contrib` when none are declared, `k8s` shown as
/// `K8s`.
fn format_distributions(component: &MergedComponent,) -> String
{
    let mut distributions = component.distributions().to_vec();
    if distributions.is_empty() {
        return Distribution::Contrib.as_str().to_string();
    }
    distributions.sort();
    distributions
        .into_iter()
        .map(|name| if name.eq_ignore_ascii_case("k8s",) { "K8s".to_string() } else { name },)
        .collect::<Vec<_,>>()
        .join(", ",)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::metadata::{NormalizedMetadata, Status};

    fn component(
        name: &str,
        source_repo: Distribution,
        subtype: Option<ExtensionSubtype,>,
        stability: &[(&str, &[&str],)],
        distributions: &[&str],
    ) -> MergedComponent
    {
        let metadata = NormalizedMetadata {
            status: Some(Status {
                stability: Some(
                    stability
                        .iter()
                        .map(|(level, signals,)| {
                            (level.to_string(), signals.iter().map(ToString::to_string,).collect(),)
                        },)
                        .collect(),
                ),
                distributions: Some(distributions.iter().map(ToString::to_string,).collect(),),
                ..Status::default()
            },),
            ..NormalizedMetadata::default()
        };
        MergedComponent {
            name: name.to_string(),
            subtype,
            source_repo,
            metadata: Some(metadata,),
            has_metadata: true,
        }
    }

    #[test]
    fn receiver_table_has_signal_columns_and_footnotes()
    {
        let receivers = vec![
            component(
                "otlpreceiver",
                Distribution::Core,
                None,
                &[("stable", &["traces", "metrics"],), ("beta", &["logs"],)],
                &["core", "contrib", "k8s"],
            ),
            component("carbonreceiver", Distribution::Contrib, None, &[("unmaintained", &["metrics"],)], &[],),
        ];
        let table =
            DocContentGenerator::default().generate_table(ComponentType::Receiver, &receivers, None, true,);
        let lines: Vec<&str,> = table.lines().collect();

        assert_eq!(lines[0], "| Name | Distributions[^1] | Traces[^2] | Metrics[^2] | Logs[^2] |");
        assert_eq!(
            lines[2],
            "| [carbonreceiver](https://github.com/open-telemetry/opentelemetry-collector-contrib/tree/main/receiver/carbonreceiver) ⚠️ | contrib | - | unmaintained | - |"
        );
        assert_eq!(
            lines[3],
            "| [otlpreceiver](https://github.com/open-telemetry/opentelemetry-collector/tree/main/receiver/otlpreceiver) | contrib, core, K8s | stable | stable | beta |"
        );
        assert!(table.contains("[^2]:\n"));
    }

    #[test]
    fn connector_table_omits_stability()
    {
        let connectors =
            vec![component("countconnector", Distribution::Contrib, None, &[("unmaintained", &["traces"],)], &["contrib"],)];
        let table =
            DocContentGenerator::default().generate_table(ComponentType::Connector, &connectors, None, true,);
        assert!(table.starts_with("| Name | Distributions[^1] |\n"));
        assert!(table.contains("countconnector) | contrib |\n"));
        assert!(!table.contains("⚠️"));
        assert!(!table.contains("[^2]:"));
    }

    #[test]
    fn extension_subtypes_get_separate_tables()
    {
        let inventory = MergedInventory {
            components: BTreeMap::from([(
                ComponentType::Extension,
                vec![
                    component("zpagesextension", Distribution::Core, None, &[("beta", &["extension"],)], &["core"],),
                    component(
                        "filestorage",
                        Distribution::Contrib,
                        Some(ExtensionSubtype::Storage,),
                        &[],
                        &["contrib"],
                    ),
                ],
            )],),
        };
        let tables = DocContentGenerator::default().generate_all_tables(&inventory,);

        let keys: Vec<&str,> = tables.keys().map(String::as_str,).collect();
        assert_eq!(
            keys,
            ["connector", "exporter", "extension", "extension-footnotes", "extension-storage", "processor", "receiver"]
        );
        assert!(tables["extension"].contains("| beta |"));
        assert!(!tables["extension"].contains("filestorage"));
        assert!(tables["extension-storage"].contains("tree/main/extension/storage/filestorage) | contrib | N/A |"));
        assert!(!tables["extension"].contains("[^1]:"));
        assert!(tables[EXTENSION_FOOTNOTES_KEY].starts_with("[^1]:\n"));
    }
}
