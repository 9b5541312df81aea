// crates/datacore-cli/src/main.rs
// ============================================================================
// Module: Datacore Companion CLI Entry Point
// Description: Command dispatcher wiring config, cache, transports, and sync.
// Purpose: Drive the companion data-access core from a terminal.
// Dependencies: clap, datacore-config, datacore-store-sqlite, datacore-sync,
//               datacore-transport, thiserror, tokio
// ============================================================================

//! ## Overview
//! `datacore-companion` loads the companion config, opens the shared cache,
//! and builds a [`DataCoordinator`] over the direct transport with a relay
//! fallback. The CLI has no paired host: its relay link is never activated,
//! so every relay attempt reports `unreachable` while the fallback chain
//! still runs.
//!
//! Complication timelines are built from a read-only handle on the shared
//! cache, the way an out-of-process renderer reads it.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use datacore_config::CompanionConfig;
use datacore_config::ConfigError;
use datacore_config::DEFAULT_CONFIG_NAME;
use datacore_config::SharedConfigStore;
use datacore_core::CacheKey;
use datacore_core::CacheStore;
use datacore_core::InMemoryCacheStore;
use datacore_core::IntervalId;
use datacore_core::SystemClock;
use datacore_core::VehicleId;
use datacore_store_sqlite::SqliteCacheStore;
use datacore_sync::BackgroundRefreshScheduler;
use datacore_sync::CancelToken;
use datacore_sync::Complication;
use datacore_sync::DataCoordinator;
use datacore_sync::LoadAllReport;
use datacore_sync::RefreshOutcome;
use datacore_sync::SyncEvent;
use datacore_sync::SyncEventDetail;
use datacore_sync::SyncEventSink;
use datacore_sync::TimelineProvider;
use datacore_sync::TimelineReloader;
use datacore_sync::TokioWakeupPlatform;
use datacore_sync::build_event_sink;
use datacore_transport::AppliedPush;
use datacore_transport::ConfigPushDelegate;
use datacore_transport::DirectTransport;
use datacore_transport::HostSession;
use datacore_transport::RelayLink;
use datacore_transport::RelayTransport;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "datacore-companion", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to `datacore-companion.toml`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Hydrate from the cache, then refresh every read.
    Refresh,
    /// Print cached summaries without touching the network.
    Status,
    /// Log a fuel fill-up.
    LogFuel(LogFuelCommand),
    /// Mark a maintenance interval as serviced today.
    MarkService(MarkServiceCommand),
    /// Log hours worked this month.
    LogHours(LogHoursCommand),
    /// Print a complication timeline as JSON.
    Timeline(TimelineCommand),
    /// Run the background refresh scheduler until interrupted.
    Run,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the config file.
    Validate,
}

/// Arguments for `log-fuel`.
#[derive(Args, Debug)]
struct LogFuelCommand {
    /// Vehicle identifier.
    #[arg(long)]
    vehicle: u64,
    /// Gallons added.
    #[arg(long)]
    gallons: f64,
    /// Total cost of the fill-up.
    #[arg(long)]
    cost: f64,
    /// Odometer reading at fill-up.
    #[arg(long)]
    odometer: u64,
}

/// Arguments for `mark-service`.
#[derive(Args, Debug)]
struct MarkServiceCommand {
    /// Maintenance interval identifier.
    #[arg(long)]
    interval: u64,
}

/// Arguments for `log-hours`.
#[derive(Args, Debug)]
struct LogHoursCommand {
    /// Hours worked.
    #[arg(long)]
    hours: f64,
}

/// Arguments for `timeline`.
#[derive(Args, Debug)]
struct TimelineCommand {
    /// Complication: fleet, fuel, `launch_countdown`, or `work_hours`.
    complication: Complication,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI errors.
#[derive(Debug, Error)]
enum CliError {
    /// Config could not be loaded or validated.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Event sink could not be opened.
    #[error("event log error: {0}")]
    Events(String),
    /// Shared cache could not be opened.
    #[error("cache error: {0}")]
    Cache(String),
    /// Transport could not be built.
    #[error("transport error: {0}")]
    Transport(String),
    /// Output could not be written.
    #[error("failed to write {stream}: {message}")]
    Output {
        /// Stream label.
        stream: &'static str,
        /// Underlying error.
        message: String,
    },
    /// A command reported a failure to the user.
    #[error("{0}")]
    Failed(String),
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(config_path),
        Commands::Refresh => command_refresh(config_path).await,
        Commands::Status => command_status(config_path),
        Commands::LogFuel(command) => command_log_fuel(config_path, &command).await,
        Commands::MarkService(command) => command_mark_service(config_path, &command).await,
        Commands::LogHours(command) => command_log_hours(config_path, &command).await,
        Commands::Timeline(command) => command_timeline(config_path, &command),
        Commands::Run => command_run(config_path).await,
    }
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Fully wired companion core.
struct Companion {
    /// Loaded configuration.
    config: CompanionConfig,
    /// Process-wide shared config.
    shared: SharedConfigStore,
    /// Event sink.
    events: Arc<dyn SyncEventSink>,
    /// Coordinator over the shared cache.
    coordinator: Arc<DataCoordinator>,
    /// Watch-side config push delegate.
    pushes: ConfigPushDelegate,
    /// Host end of the relay link; never activated by the CLI.
    _host: HostSession,
}

/// Loads the config and builds the companion core.
fn build_companion(config_path: Option<&Path>) -> CliResult<Companion> {
    let config = CompanionConfig::load(config_path)?;
    let events =
        build_event_sink(&config.logging).map_err(|err| CliError::Events(err.to_string()))?;
    let shared = SharedConfigStore::from_config(&config);
    let direct = DirectTransport::new(shared.clone(), &config.transport)
        .map_err(|err| CliError::Transport(err.to_string()))?;
    let (watch, host) = RelayLink::pair(config.transport.relay_reply_timeout());
    let relay = RelayTransport::new(Arc::new(watch.session));
    let cache = SqliteCacheStore::open(&config.sqlite_cache_config())
        .map_err(|err| CliError::Cache(err.to_string()))?;
    let coordinator = DataCoordinator::new(Arc::new(direct), Arc::new(relay), Arc::new(cache))
        .with_events(Arc::clone(&events));
    let pushes = ConfigPushDelegate::new(shared.clone(), watch.user_info);
    Ok(Companion {
        config,
        shared,
        events,
        coordinator: Arc::new(coordinator),
        pushes,
        _host: host,
    })
}

/// Opens the shared cache the way a complication renderer does.
///
/// A missing or unreadable cache yields an empty store so timelines render
/// placeholders.
fn open_complication_cache(path: &Path, events: &dyn SyncEventSink) -> Arc<dyn CacheStore> {
    match SqliteCacheStore::open_read_only(path) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            events.record(&SyncEvent::new(SyncEventDetail::CacheError {
                key: None,
                message: err.to_string(),
            }));
            Arc::new(InMemoryCacheStore::new())
        }
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes `config validate`.
fn command_config_validate(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = CompanionConfig::load(config_path)?;
    let label = config_path.map_or_else(|| DEFAULT_CONFIG_NAME.to_string(), path_label);
    write_stdout_line(&format!("config ok: {label}"))?;
    write_stdout_line(&format!("cache: {}", path_label(&config.container.cache_path())))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `refresh`.
async fn command_refresh(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let companion = build_companion(config_path)?;
    let report = companion.coordinator.open().await;
    for line in report_lines(&report) {
        write_stdout_line(&line)?;
    }
    if let Some(error) = companion.coordinator.state().last_error.get() {
        write_stdout_line(&format!("last error: {error}"))?;
    }
    let code = if report.stored_count() > 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE };
    Ok(code)
}

/// Executes `status`.
fn command_status(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let companion = build_companion(config_path)?;
    let coordinator = &companion.coordinator;
    coordinator.hydrate();
    let server =
        companion.shared.base_address().unwrap_or_else(|| "(not configured)".to_string());
    write_stdout_line(&format!("server: {server}"))?;
    write_stdout_line(&format!(
        "last updated: {}",
        coordinator.last_refresh_description().unwrap_or_else(|| "never".to_string())
    ))?;
    for key in CacheKey::ALL {
        let state = if coordinator.state().is_loaded(key) { "cached" } else { "empty" };
        write_stdout_line(&format!("{key}: {state}"))?;
    }
    if let Some(vehicle) = coordinator.primary_vehicle() {
        let mileage = vehicle
            .current_mileage
            .as_ref()
            .map_or_else(String::new, |miles| format!(" ({miles} mi)"));
        write_stdout_line(&format!("primary vehicle: {}{mileage}", vehicle.label()))?;
    }
    if let Some(alert) = coordinator.urgent_alerts().first() {
        let name = alert.name.clone().unwrap_or_else(|| format!("interval {}", alert.interval_id));
        write_stdout_line(&format!("top alert: {name} ({})", alert.status.as_str()))?;
    }
    if let Some(Some(launch)) = coordinator.state().next_launch.get() {
        write_stdout_line(&format!("next launch: {}", launch.name))?;
    }
    if let Some(ytd) = coordinator.ytd_hours() {
        let month = coordinator.current_month_hours().unwrap_or(0.0);
        write_stdout_line(&format!("hours: {month:.1} this month, {ytd:.1} this year"))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `log-fuel`.
async fn command_log_fuel(
    config_path: Option<&Path>,
    command: &LogFuelCommand,
) -> CliResult<ExitCode> {
    let companion = build_companion(config_path)?;
    companion.coordinator.hydrate();
    let vehicle = VehicleId::new(command.vehicle);
    let ok = companion
        .coordinator
        .log_fuel(vehicle, command.gallons, command.cost, command.odometer)
        .await;
    mutation_result(&companion, ok, "fuel logged")
}

/// Executes `mark-service`.
async fn command_mark_service(
    config_path: Option<&Path>,
    command: &MarkServiceCommand,
) -> CliResult<ExitCode> {
    let companion = build_companion(config_path)?;
    companion.coordinator.hydrate();
    let ok = companion.coordinator.mark_service_done(IntervalId::new(command.interval)).await;
    mutation_result(&companion, ok, "service recorded")
}

/// Executes `log-hours`.
async fn command_log_hours(
    config_path: Option<&Path>,
    command: &LogHoursCommand,
) -> CliResult<ExitCode> {
    let companion = build_companion(config_path)?;
    companion.coordinator.hydrate();
    let ok = companion.coordinator.log_work_hours(command.hours).await;
    mutation_result(&companion, ok, "hours logged")
}

/// Executes `timeline`.
fn command_timeline(config_path: Option<&Path>, command: &TimelineCommand) -> CliResult<ExitCode> {
    let config = CompanionConfig::load(config_path)?;
    let events =
        build_event_sink(&config.logging).map_err(|err| CliError::Events(err.to_string()))?;
    let cache = open_complication_cache(&config.container.cache_path(), events.as_ref());
    let provider = TimelineProvider::new(cache, Arc::new(SystemClock))
        .with_reload_after(config.scheduler.refresh_interval());
    let timeline = provider.timeline(command.complication);
    let rendered = serde_json::to_string_pretty(&timeline)
        .map_err(|err| CliError::Failed(format!("timeline encoding failed: {err}")))?;
    write_stdout_line(&rendered)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `run`.
async fn command_run(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let Companion {
        config,
        events,
        coordinator,
        mut pushes,
        _host,
        ..
    } = build_companion(config_path)?;
    let report = coordinator.open().await;
    write_stdout_line(&format!(
        "initial refresh: {} stored, {} failed",
        report.stored_count(),
        report.failed_count()
    ))?;
    let reloader = ConsoleTimelineReloader {
        cache_path: config.container.cache_path(),
        events: Arc::clone(&events),
    };
    let scheduler = BackgroundRefreshScheduler::launch(
        Arc::clone(&coordinator),
        Arc::new(TokioWakeupPlatform::new()),
        Arc::new(reloader),
        config.scheduler.refresh_interval(),
        Arc::clone(&events),
    );
    let shutdown = CancelToken::new();
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        interrupt.cancel();
    });
    let push_events = Arc::clone(&events);
    let push_shutdown = shutdown.clone();
    let push_loop = async move {
        loop {
            tokio::select! {
                biased;
                () = push_shutdown.cancelled() => return,
                applied = pushes.next_applied() => match applied {
                    Some(applied) => push_events.record(&config_push_event(&applied)),
                    None => return,
                },
            }
        }
    };
    tokio::join!(scheduler.run(&shutdown), push_loop);
    write_stdout_line("scheduler stopped")?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Timeline Reloads
// ============================================================================

/// Reloader rebuilding every complication timeline from the shared cache.
struct ConsoleTimelineReloader {
    /// Shared cache path.
    cache_path: PathBuf,
    /// Event sink for cache errors.
    events: Arc<dyn SyncEventSink>,
}

impl TimelineReloader for ConsoleTimelineReloader {
    fn reload_all_timelines(&self) {
        let cache = open_complication_cache(&self.cache_path, self.events.as_ref());
        let provider = TimelineProvider::new(cache, Arc::new(SystemClock));
        let summary = Complication::ALL
            .into_iter()
            .map(|complication| {
                format!("{complication}={}", provider.timeline(complication).entries.len())
            })
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write_stdout_line(&format!("timelines reloaded: {summary}"));
    }
}

// ============================================================================
// SECTION: Formatting
// ============================================================================

/// Renders one line per key of a group refresh.
fn report_lines(report: &LoadAllReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .outcomes
        .iter()
        .map(|(key, outcome)| format!("{key}: {}", describe_outcome(outcome)))
        .collect();
    let marked = if report.marked { "advanced" } else { "unchanged" };
    lines.push(format!(
        "stored {} of {} (refresh mark {marked})",
        report.stored_count(),
        report.outcomes.len()
    ));
    lines
}

/// Describes a keyed refresh outcome.
fn describe_outcome(outcome: &RefreshOutcome) -> String {
    match outcome {
        RefreshOutcome::Stored {
            transport,
            bytes,
        } => format!("stored via {transport} ({bytes} bytes)"),
        RefreshOutcome::Failed(failure) => format!("failed [{}] {failure}", failure.kind()),
        RefreshOutcome::Cancelled => "cancelled".to_string(),
    }
}

/// Builds the event recorded for an applied config push.
fn config_push_event(applied: &AppliedPush) -> SyncEvent {
    let (changed, error) = match &applied.result {
        Ok(changed) => (*changed, None),
        Err(err) => (false, Some(err.to_string())),
    };
    SyncEvent::new(SyncEventDetail::ConfigPush {
        changed,
        cleared: applied.push.address().is_none(),
        error,
    })
}

/// Reports a mutation result.
fn mutation_result(companion: &Companion, ok: bool, success: &str) -> CliResult<ExitCode> {
    if ok {
        write_stdout_line(success)?;
        return Ok(ExitCode::SUCCESS);
    }
    let message = companion
        .coordinator
        .state()
        .last_error
        .get()
        .unwrap_or_else(|| "mutation failed".to_string());
    Err(CliError::Failed(message))
}

/// Renders a path for display.
fn path_label(path: &Path) -> String {
    path.display().to_string()
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::Output {
        stream: "stdout",
        message: err.to_string(),
    })
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}
