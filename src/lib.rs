//! Automation for the OpenTelemetry ecosystem registry.
//!
//! The library scans OpenTelemetry Collector checkouts into versioned
//! component inventories, keeps the Java agent instrumentation list per
//! release, builds the content-addressed explorer database from it and
//! regenerates the component tables of the opentelemetry.io documentation
//! between marker comments. Filesystem layouts are deterministic: maps are
//! ordered, YAML and JSON are written with stable key order, and repeated runs
//! over unchanged inputs produce byte-identical output.

pub mod builder;
pub mod collector_sync;
pub mod component;
pub mod config;
pub mod content;
pub mod database;
pub mod diagnostics;
pub mod docs_sync;
mod error;
pub mod gh;
pub mod git;
pub mod hashing;
pub mod instrumentation;
pub mod instrumentation_inventory;
pub mod instrumentation_sync;
pub mod inventory;
pub mod markers;
pub mod merge;
pub mod metadata;
pub mod repository;
pub mod retry;
pub mod scanner;
pub mod spelling;
pub mod version;

pub use builder::{process_version, release_versions, run_builder};
pub use collector_sync::{CollectorSync, SyncSummary, SyncedVersion};
pub use component::{
    ComponentRecord, ComponentType, ComponentsByType, Distribution, ExtensionSubtype,
    empty_components,
};
pub use config::{AutomationConfig, load_config, parse_config};
pub use content::DocContentGenerator;
pub use database::{DatabaseStats, DatabaseWriter};
pub use diagnostics::{ComponentIssue, IssueKind, MetadataDiagnostics};
pub use docs_sync::{DocsSyncReport, PageOutcome, PageUpdate, run_docs_sync};
pub use error::{Error, io_error};
pub use gh::GithubClient;
pub use git::{GitRepository, ReleaseSource};
pub use hashing::content_hash;
pub use instrumentation::{FileFormat, parse_instrumentation_yaml};
pub use instrumentation_inventory::InstrumentationInventory;
pub use instrumentation_sync::{InstrumentationSource, InstrumentationSync, InstrumentationSyncSummary};
pub use inventory::{Inventory, InventoryManager};
pub use markers::DocMarkerUpdater;
pub use merge::{MergedComponent, MergedInventory, merge_inventories};
pub use metadata::{MetadataParser, NormalizedMetadata, normalize_metadata, parse_metadata_str};
pub use repository::{RepositoryManager, RepositorySpec};
pub use scanner::ComponentScanner;
pub use spelling::{Cspell, SpellChecker, SpellingReport, fix_component_spelling};
pub use version::Version;
