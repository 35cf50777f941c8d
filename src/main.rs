//! Command-line interface for the ecosystem automation tools.
//!
//! Each subcommand wraps one pipeline: scanning a collector checkout, syncing
//! the collector or Java agent inventories, building the explorer database and
//! maintaining the collector component pages of the documentation.

use std::{
    io,
    path::{Path, PathBuf},
    process, slice,
};

use clap::{ArgAction, Args, Parser, Subcommand};
use ecosystem_automation::{
    AutomationConfig, CollectorSync, ComponentScanner, Cspell, DatabaseWriter, Distribution,
    DocMarkerUpdater, Error, GitRepository, GithubClient, InstrumentationInventory,
    InstrumentationSync, InventoryManager, ReleaseSource, RepositoryManager, RepositorySpec, Version,
    fix_component_spelling, gh::split_repository, io_error, load_config, run_builder,
    run_docs_sync,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line interface for the OpenTelemetry ecosystem automation.
#[derive(Debug, Parser,)]
#[command(name = "ecosystem-automation", version, about = "Maintain the OpenTelemetry ecosystem registry")]
struct Cli
{
    /// Optional YAML configuration overriding the default locations.
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf,>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand,)]
/// Supported commands exposed by the CLI.
enum Command
{
    /// Print the components of a collector checkout as JSON.
    Scan(ScanArgs,),
    /// Record new collector releases and refresh the snapshots.
    #[command(name = "collector-sync")]
    CollectorSync(CollectorSyncArgs,),
    /// Record new Java agent instrumentation lists.
    #[command(name = "javaagent-sync")]
    JavaagentSync(JavaagentSyncArgs,),
    /// Build the explorer database from the Java agent inventory.
    #[command(name = "build-db")]
    BuildDb(BuildDbArgs,),
    /// Regenerate the component tables of the documentation.
    #[command(name = "update-docs")]
    UpdateDocs(UpdateDocsArgs,),
    /// Add unknown words of the component pages to their cspell lists.
    #[command(name = "fix-spelling")]
    FixSpelling(DocsRepoArgs,),
}

#[derive(Debug, Args,)]
struct ScanArgs
{
    /// Root of the collector checkout.
    #[arg(long = "repo", value_name = "DIR")]
    repo: PathBuf,

    /// Output formatted JSON for easier inspection.
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pretty: bool,
}

/// Version selection shared by both sync commands.
#[derive(Debug, Args, Default,)]
struct BackfillArgs
{
    /// Process historical releases instead of the latest one.
    #[arg(long = "backfill", action = ArgAction::SetTrue)]
    backfill: bool,

    /// Releases to backfill; every upstream release when omitted.
    #[arg(long = "versions", value_name = "VERSION", value_delimiter = ',', num_args = 1..)]
    versions: Vec<Version,>,

    /// Backfill at most this many releases, newest first.
    #[arg(long = "limit", value_name = "N")]
    limit: Option<usize,>,
}

#[derive(Debug, Args,)]
struct CollectorSyncArgs
{
    #[command(flatten)]
    backfill: BackfillArgs,

    /// Restrict the run to one distribution.
    #[arg(long = "distribution", value_name = "NAME")]
    distribution: Option<Distribution,>,
}

#[derive(Debug, Args,)]
struct JavaagentSyncArgs
{
    #[command(flatten)]
    backfill: BackfillArgs,

    /// Token used for GitHub API requests.
    #[arg(long = "token", env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String,>,
}

#[derive(Debug, Args,)]
struct BuildDbArgs
{
    /// Remove the existing database first.
    #[arg(long = "clean", action = ArgAction::SetTrue)]
    clean: bool,

    /// Database directory overriding the configuration.
    #[arg(long = "output", value_name = "DIR")]
    output: Option<PathBuf,>,
}

#[derive(Debug, Args,)]
struct DocsRepoArgs
{
    /// Existing opentelemetry.io checkout; cloned or updated when omitted.
    #[arg(long = "docs-repo", value_name = "DIR")]
    docs_repo: Option<PathBuf,>,
}

#[derive(Debug, Args,)]
struct UpdateDocsArgs
{
    #[command(flatten)]
    docs: DocsRepoArgs,

    /// Write a GitHub issue body here when metadata problems are found.
    #[arg(long = "issue-body", value_name = "PATH")]
    issue_body: Option<PathBuf,>,
}

/// Entry point that reports errors and sets the appropriate exit status.
fn main()
{
    init_tracing();
    if let Err(error,) = run() {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

fn init_tracing()
{
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG",).unwrap_or_else(|_| "info".to_string(),),),)
        .with(tracing_subscriber::fmt::layer().with_target(false,).with_writer(io::stderr,),)
        .init();
}

/// Executes the CLI using parsed arguments.
///
/// # Errors
///
/// Propagates errors of configuration loading and of the selected pipeline.
fn run() -> Result<(), Error,>
{
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref(),)?;

    match cli.command {
        Command::Scan(args,) => run_scan(args,),
        Command::CollectorSync(args,) => run_collector_sync(&config, args,),
        Command::JavaagentSync(args,) => run_javaagent_sync(&config, args,),
        Command::BuildDb(args,) => run_build_db(&config, args,),
        Command::UpdateDocs(args,) => run_update_docs(&config, args,),
        Command::FixSpelling(args,) => run_fix_spelling(&config, args,),
    }
}

fn resolve_config(path: Option<&Path,>,) -> Result<AutomationConfig, Error,>
{
    match path {
        Some(path,) => load_config(path,),
        None => Ok(AutomationConfig::default(),),
    }
}

fn run_scan(args: ScanArgs,) -> Result<(), Error,>
{
    let components = ComponentScanner::new(&args.repo,)?.scan_all()?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, &components, args.pretty,)
}

fn write_json<W: io::Write, T: serde::Serialize,>(writer: &mut W, value: &T, pretty: bool,) -> Result<(), Error,>
{
    if pretty {
        serde_json::to_writer_pretty(writer, value,)?;
    } else {
        serde_json::to_writer(writer, value,)?;
    }

    Ok((),)
}

/// Releases a backfill should visit: the requested ones, or every available
/// release, capped at `limit`.
fn select_backfill_versions(
    args: &BackfillArgs,
    available: impl FnOnce() -> Result<Vec<Version,>, Error,>,
) -> Result<Vec<Version,>, Error,>
{
    let mut versions = if args.versions.is_empty() {
        available()?.into_iter().filter(|version| !version.is_prerelease,).collect()
    } else {
        args.versions.clone()
    };
    if let Some(limit,) = args.limit {
        versions.truncate(limit,);
    }
    Ok(versions,)
}

fn progress_bar(len: usize,) -> ProgressBar
{
    let pb = ProgressBar::new(len as u64,);
    if let Ok(style,) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}",) {
        pb.set_style(style,);
    }
    pb
}

fn run_collector_sync(config: &AutomationConfig, args: CollectorSyncArgs,) -> Result<(), Error,>
{
    let distributions = args.distribution.map_or_else(|| Distribution::ALL.to_vec(), |distribution| vec![distribution],);
    let repositories = RepositoryManager::from_env(&config.repos_dir,);

    let mut sync = CollectorSync::new(InventoryManager::new(&config.collector_inventory,),);
    for distribution in distributions {
        let repository = repositories.setup(RepositorySpec::for_distribution(distribution,), None, true,)?;
        let path = repository.path().to_path_buf();
        sync = sync.with_distribution(distribution, repository, path,);
    }

    if !args.backfill.backfill {
        let summary = sync.sync()?;
        info!(
            "Sync finished: {} new release(s), {} snapshot(s) updated",
            summary.new_releases.len(),
            summary.snapshots_updated.len()
        );
        return Ok((),);
    }

    let distributions: Vec<Distribution,> = sync.distributions().collect();
    for distribution in distributions {
        let source: &GitRepository = sync.source(distribution,)?;
        let versions = select_backfill_versions(&args.backfill, || source.release_tags(),)?;
        info!("Backfilling {} {distribution} version(s)", versions.len());

        let pb = progress_bar(versions.len(),);
        let mut processed = 0;
        for version in &versions {
            pb.set_message(format!("{distribution} {version}"),);
            processed += sync.backfill(distribution, slice::from_ref(version,),)?.len();
            pb.inc(1,);
        }
        pb.finish_and_clear();

        source.checkout_main()?;
        info!("Backfilled {processed} {distribution} version(s)");
    }
    Ok((),)
}

fn run_javaagent_sync(config: &AutomationConfig, args: JavaagentSyncArgs,) -> Result<(), Error,>
{
    let (_, repository_name,) = split_repository(&config.javaagent_repository,)?;
    let client = GithubClient::new(&config.javaagent_repository, &config.instrumentation_list_path, args.token.as_deref(),)?;
    let sync = InstrumentationSync::new(client, InstrumentationInventory::new(&config.javaagent_inventory,), repository_name,);

    if !args.backfill.backfill {
        let summary = sync.sync()?;
        match summary.new_release {
            Some(version,) => info!("Recorded release {version}"),
            None => info!("No new release"),
        }
        if let Some(snapshot,) = summary.snapshot_updated {
            info!("Snapshot {snapshot} updated");
        }
        return Ok((),);
    }

    let versions = select_backfill_versions(&args.backfill, || sync.available_releases(),)?;
    info!("Backfilling {} version(s)", versions.len());

    let pb = progress_bar(versions.len(),);
    let mut processed = 0;
    for version in &versions {
        pb.set_message(version.to_string(),);
        processed += sync.backfill(slice::from_ref(version,),)?.len();
        pb.inc(1,);
    }
    pb.finish_and_clear();

    info!("Backfilled {processed} version(s)");
    Ok((),)
}

fn run_build_db(config: &AutomationConfig, args: BuildDbArgs,) -> Result<(), Error,>
{
    let inventory = InstrumentationInventory::new(&config.javaagent_inventory,);
    let mut writer = DatabaseWriter::new(args.output.unwrap_or_else(|| config.database_dir.clone(),),);
    run_builder(&inventory, &mut writer, args.clean,)?;
    Ok((),)
}

/// Documentation checkout to work on: the given directory or a managed clone.
fn docs_checkout(config: &AutomationConfig, args: &DocsRepoArgs,) -> Result<PathBuf, Error,>
{
    match &args.docs_repo {
        Some(path,) => Ok(GitRepository::open(path.clone(),)?.path().to_path_buf(),),
        None => {
            let repository = RepositoryManager::from_env(&config.repos_dir,).setup(RepositorySpec::DOCS, None, true,)?;
            Ok(repository.path().to_path_buf(),)
        }
    }
}

fn run_update_docs(config: &AutomationConfig, args: UpdateDocsArgs,) -> Result<(), Error,>
{
    let docs_repo = docs_checkout(config, &args.docs,)?;
    let updater = DocMarkerUpdater::new(config.marker_prefix.clone(), config.marker_source.clone(),);
    let inventory = InventoryManager::new(&config.collector_inventory,);

    let report = run_docs_sync(&inventory, &config.components_dir(&docs_repo,), &updater,)?;
    if let Some(path,) = args.issue_body
        && report.diagnostics.has_issues()
    {
        std::fs::write(&path, report.diagnostics.github_issue_body(),).map_err(|e| io_error(&path, e,),)?;
        warn!("Wrote metadata issue report to {}", path.display());
    }
    Ok((),)
}

fn run_fix_spelling(config: &AutomationConfig, args: DocsRepoArgs,) -> Result<(), Error,>
{
    let docs_repo = docs_checkout(config, &args,)?;
    fix_component_spelling(&docs_repo, &Cspell,);
    Ok((),)
}
