//! Configuration document for the automation tools.
//!
//! Every field has a default, so an absent or empty file yields the standard
//! layout. Unknown fields are rejected so that typos surface early.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    database::DEFAULT_DATABASE_DIR,
    error::{self, Error},
    gh::{DEFAULT_INSTRUMENTATION_LIST_PATH, DEFAULT_JAVAAGENT_REPO, split_repository},
    instrumentation_inventory::DEFAULT_JAVAAGENT_INVENTORY,
    inventory::DEFAULT_COLLECTOR_INVENTORY,
    markers::{DEFAULT_MARKER_PREFIX, DEFAULT_MARKER_SOURCE},
    repository::DEFAULT_REPOS_DIR,
    spelling::COMPONENT_DOCS_PATH,
};

/// Paths and identifiers shared by the subcommands.
///
/// # Examples
///
/// ```
/// use ecosystem_automation::AutomationConfig;
///
/// let config = ecosystem_automation::parse_config("database_dir: public/data\n")?;
/// assert_eq!(config.database_dir.to_str(), Some("public/data"));
/// assert_eq!(config.marker_prefix, AutomationConfig::default().marker_prefix);
/// # Ok::<(), ecosystem_automation::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct AutomationConfig
{
    /// Root of the collector inventory.
    pub collector_inventory:       PathBuf,
    /// Root of the Java agent inventory.
    pub javaagent_inventory:       PathBuf,
    /// Output directory of the explorer database.
    pub database_dir:              PathBuf,
    /// Directory receiving repository clones.
    pub repos_dir:                 PathBuf,
    /// Java agent repository as `owner/name`.
    #[serde(deserialize_with = "deserialize_repository")]
    pub javaagent_repository:      String,
    /// Instrumentation list path inside the Java agent repository.
    pub instrumentation_list_path: String,
    /// Prefix of the documentation markers.
    pub marker_prefix:             String,
    /// Source written into documentation markers.
    pub marker_source:             String,
    /// Component pages relative to the documentation repository.
    pub docs_components_path:      PathBuf,
}

impl Default for AutomationConfig
{
    fn default() -> Self
    {
        Self {
            collector_inventory:       PathBuf::from(DEFAULT_COLLECTOR_INVENTORY,),
            javaagent_inventory:       PathBuf::from(DEFAULT_JAVAAGENT_INVENTORY,),
            database_dir:              PathBuf::from(DEFAULT_DATABASE_DIR,),
            repos_dir:                 PathBuf::from(DEFAULT_REPOS_DIR,),
            javaagent_repository:      DEFAULT_JAVAAGENT_REPO.to_string(),
            instrumentation_list_path: DEFAULT_INSTRUMENTATION_LIST_PATH.to_string(),
            marker_prefix:             DEFAULT_MARKER_PREFIX.to_string(),
            marker_source:             DEFAULT_MARKER_SOURCE.to_string(),
            docs_components_path:      PathBuf::from(COMPONENT_DOCS_PATH,),
        }
    }
}

impl AutomationConfig
{
    /// Checks that no path or identifier is blank.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first blank field.
    pub fn validate(&self,) -> Result<(), Error,>
    {
        let paths = [
            ("collector_inventory", &self.collector_inventory,),
            ("javaagent_inventory", &self.javaagent_inventory,),
            ("database_dir", &self.database_dir,),
            ("repos_dir", &self.repos_dir,),
            ("docs_components_path", &self.docs_components_path,),
        ];
        if let Some((field, _,),) = paths.iter().find(|(_, path,)| path.as_os_str().is_empty(),) {
            return Err(Error::validation(format!("{field} must not be empty"),),);
        }

        let values = [
            ("instrumentation_list_path", &self.instrumentation_list_path,),
            ("marker_prefix", &self.marker_prefix,),
            ("marker_source", &self.marker_source,),
        ];
        if let Some((field, _,),) = values.iter().find(|(_, value,)| value.trim().is_empty(),) {
            return Err(Error::validation(format!("{field} must not be empty"),),);
        }

        split_repository(&self.javaagent_repository,).map(drop,)
    }

    /// Component pages inside the documentation checkout at `docs_repo`.
    pub fn components_dir(&self, docs_repo: &Path,) -> PathBuf
    {
        docs_repo.join(&self.docs_components_path,)
    }
}

/// Loads and validates the configuration at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read and the errors of
/// [`parse_config`] otherwise.
pub fn load_config(path: &Path,) -> Result<AutomationConfig, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
    parse_config(&contents,)
}

/// Parses and validates a configuration document. Blank documents yield the
/// defaults.
///
/// # Errors
///
/// Returns [`Error::Yaml`] for malformed documents or unknown fields and
/// [`Error::Validation`] when a value is blank or malformed.
pub fn parse_config(contents: &str,) -> Result<AutomationConfig, Error,>
{
    let config = if contents.trim().is_empty() {
        AutomationConfig::default()
    } else {
        serde_yaml::from_str::<Option<AutomationConfig,>,>(contents,)?.unwrap_or_default()
    };
    config.validate()?;
    Ok(config,)
}

fn deserialize_repository<'de, D,>(deserializer: D,) -> Result<String, D::Error,>
where
    D: serde::Deserializer<'de,>,
{
    let value = String::deserialize(deserializer,)?;
    if split_repository(&value,).is_err() {
        return Err(serde::de::Error::custom("javaagent_repository must be owner/name",),);
    }
    Ok(value,)
}
