// crates/site-bench-cli/src/main.rs
// ============================================================================
// Module: Site Bench CLI Entry Point
// Description: Command dispatcher for benchmark runs and store maintenance.
// Purpose: Run benchmarks against the SQLite store and manage its contents.
// Dependencies: clap, ctrlc, serde_json, site-bench-config, site-bench-core,
//               site-bench-store-sqlite, thiserror
// ============================================================================

//! ## Overview
//! The `site-bench` binary loads `site-bench.toml` (or the built-in defaults),
//! opens the `SQLite` store, and dispatches to `run`, `restore`, `seed`,
//! `components`, `results`, or `config`. A pending restore left by an
//! interrupted run is resumed before a new run starts. Ctrl-C requests
//! cancellation; the current test finishes and the environment is restored.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use site_bench_config::SiteBenchConfig;
use site_bench_config::config_toml_example;
use site_bench_core::BenchmarkFailure;
use site_bench_core::BenchmarkOrchestrator;
use site_bench_core::BenchmarkResult;
use site_bench_core::CancelFlag;
use site_bench_core::ComponentId;
use site_bench_core::HostEnvironmentProbe;
use site_bench_core::ProcStatusMemoryProbe;
use site_bench_core::RawBenchmarkRequest;
use site_bench_core::ResultRef;
use site_bench_core::RunLock;
use site_bench_store_sqlite::SqliteBenchStore;
use site_bench_store_sqlite::engine_version;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Definitions
// ============================================================================

/// Orchestrator over one shared `SQLite` store.
type SqliteOrchestrator = BenchmarkOrchestrator<SqliteBenchStore, SqliteBenchStore, SqliteBenchStore>;

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "site-bench", version, about = "Site performance benchmark harness")]
struct Cli {
    /// Optional config file path (defaults to site-bench.toml or env override).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a benchmark.
    Run(RunCommand),
    /// Revert component changes left by an interrupted run.
    Restore(FormatArgs),
    /// Append reference rows for the storage read workload.
    Seed(SeedCommand),
    /// Component registry utilities.
    Components {
        /// Selected components subcommand.
        #[command(subcommand)]
        command: ComponentsCommand,
    },
    /// Persisted result utilities.
    Results {
        /// Selected results subcommand.
        #[command(subcommand)]
        command: ResultsCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Output format selection.
#[derive(Args, Debug, Clone, Copy)]
struct FormatArgs {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Output formats.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable text.
    Text,
    /// JSON document.
    Json,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Test to run (`compute`, `memory`, `storage_read`, `storage_write`); repeatable.
    #[arg(long = "test", value_name = "KIND", required_unless_present = "profile")]
    tests: Vec<String>,
    /// Intensity for a test as `KIND=PERCENT`; repeatable.
    #[arg(long = "intensity", value_name = "KIND=PERCENT", value_parser = parse_intensity_arg)]
    intensities: Vec<(String, i64)>,
    /// Component that should be active during the run; repeatable. Others are
    /// deactivated for the duration of the run.
    #[arg(long = "component", value_name = "ID")]
    components: Vec<String>,
    /// Configured profile supplying tests and components.
    #[arg(long, value_name = "ID", conflicts_with_all = ["tests", "components"])]
    profile: Option<String>,
    /// Skip persisting the result.
    #[arg(long, action = ArgAction::SetTrue)]
    no_save: bool,
    /// Output format.
    #[command(flatten)]
    output: FormatArgs,
}

impl RunCommand {
    /// Builds the external request from the arguments.
    fn raw_request(&self) -> RawBenchmarkRequest {
        RawBenchmarkRequest {
            tests: self.tests.clone(),
            intensities: self.intensities.iter().cloned().collect(),
            components: self.components.clone(),
            profile_id: self.profile.clone(),
        }
    }
}

/// Arguments for `seed`.
#[derive(Args, Debug)]
struct SeedCommand {
    /// Number of reference rows to append.
    #[arg(long, value_name = "N", default_value_t = 1_000)]
    rows: u64,
}

/// Components subcommands.
#[derive(Subcommand, Debug)]
enum ComponentsCommand {
    /// List installed components and their state.
    List(FormatArgs),
    /// Register an installed component.
    Register {
        /// Component identifier.
        #[arg(long, value_name = "ID")]
        id: String,
        /// Mark the component active.
        #[arg(long, action = ArgAction::SetTrue)]
        active: bool,
    },
    /// Remove a component from the installed set.
    Unregister {
        /// Component identifier.
        #[arg(long, value_name = "ID")]
        id: String,
    },
}

/// Results subcommands.
#[derive(Subcommand, Debug)]
enum ResultsCommand {
    /// List persisted results, newest first.
    List {
        /// Maximum number of results to list.
        #[arg(long, value_name = "N", default_value_t = 20)]
        limit: u64,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the configuration file.
    Validate,
    /// Print a canonical example configuration.
    Example,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Config {
            command,
        } => command_config(cli.config, &command),
        command => {
            let config = SiteBenchConfig::load_or_default(cli.config.as_deref())
                .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
            let store = SqliteBenchStore::new(config.store.clone())
                .map_err(|err| CliError::new(format!("failed to open store: {err}")))?;
            dispatch(command, &config, &store)
        }
    }
}

/// Dispatches store-backed commands.
fn dispatch(
    command: Commands,
    config: &SiteBenchConfig,
    store: &SqliteBenchStore,
) -> CliResult<ExitCode> {
    match command {
        Commands::Run(command) => command_run(&command, config, store),
        Commands::Restore(output) => command_restore(output.format, config, store),
        Commands::Seed(command) => command_seed(&command, store),
        Commands::Components {
            command,
        } => command_components(&command, store),
        Commands::Results {
            command,
        } => command_results(&command, store),
        Commands::Config {
            ..
        } => Err(CliError::new("config commands do not open the store".to_string())),
    }
}

/// Builds an orchestrator sharing the process-wide run lock.
fn build_orchestrator(
    config: &SiteBenchConfig,
    store: &SqliteBenchStore,
    cancel: CancelFlag,
) -> CliResult<SqliteOrchestrator> {
    let orchestrator_config = config
        .orchestrator_config()
        .map_err(|err| CliError::new(format!("invalid config: {err}")))?;
    let audit = config
        .build_audit_sink()
        .map_err(|err| CliError::new(format!("failed to open audit sink: {err}")))?;
    Ok(BenchmarkOrchestrator::new(store.clone(), store.clone(), store.clone(), orchestrator_config)
        .with_environment_probe(
            HostEnvironmentProbe::new().with_detail("sqlite_version", engine_version()),
        )
        .with_memory_probe(ProcStatusMemoryProbe)
        .with_audit_sink(audit)
        .with_run_lock(RunLock::process())
        .with_cancel_flag(cancel))
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// JSON output of a completed run.
#[derive(Debug, Serialize)]
struct RunOutput<'a> {
    /// Complete result.
    result: &'a BenchmarkResult,
    /// Persisted record, when saved.
    saved: Option<SavedOutput<'a>>,
}

/// JSON form of a persisted record reference.
#[derive(Debug, Serialize)]
struct SavedOutput<'a> {
    /// Persisted record identifier.
    id: &'a str,
    /// Persisted record title.
    title: &'a str,
}

/// Executes the `run` command.
fn command_run(
    command: &RunCommand,
    config: &SiteBenchConfig,
    store: &SqliteBenchStore,
) -> CliResult<ExitCode> {
    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || handler_flag.cancel())
        .map_err(|err| CliError::new(format!("failed to install interrupt handler: {err}")))?;
    let orchestrator = build_orchestrator(config, store, cancel)?;

    if orchestrator.has_pending_restore().map_err(|err| CliError::new(err.to_string()))? {
        write_stderr_line("Pending restore found; reverting the interrupted run first.")
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
        orchestrator.resume_pending_restore().map_err(|failure| failure_error(&failure))?;
    }

    let request = command
        .raw_request()
        .resolve(Some(config))
        .map_err(|err| CliError::new(format!("invalid benchmark request: {err}")))?;

    let (result, reference) = if command.no_save {
        (orchestrator.run_benchmark(&request).map_err(|failure| failure_error(&failure))?, None)
    } else {
        let persisted = orchestrator
            .run_and_persist(&request, store)
            .map_err(|failure| failure_error(&failure))?;
        (persisted.result, Some(persisted.reference))
    };

    match command.output.format {
        OutputFormat::Json => write_json(&RunOutput {
            result: &result,
            saved: reference.as_ref().map(|reference| SavedOutput {
                id: &reference.id,
                title: &reference.title,
            }),
        })?,
        OutputFormat::Text => write_result_text(&result, reference.as_ref())?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Renders a completed result as text.
fn write_result_text(result: &BenchmarkResult, reference: Option<&ResultRef>) -> CliResult<()> {
    let display = result.display();
    let mut lines = vec![
        format!("Benchmark {}", result.run_id),
        format!("Total duration: {}", display.total_duration),
        format!("Total score: {}", display.score_total),
    ];
    for test in &display.tests {
        let peak = test
            .peak_memory
            .as_ref()
            .map_or_else(String::new, |peak| format!(", peak memory {peak}"));
        lines.push(format!(
            "{}: intensity {}, duration {}, score {}{peak}",
            test.kind.display_name(),
            test.intensity,
            test.duration,
            test.score
        ));
        lines.push(format!("  {}", test.detail));
    }
    lines.push(format!("Components after run: {}", result.environment_after.joined()));
    if let Some(reference) = reference {
        lines.push(format!("Saved as {} ({})", reference.title, reference.id));
    }
    for line in lines {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(())
}

/// Writes the failure log to stderr and converts the failure to an error.
fn failure_error(failure: &BenchmarkFailure) -> CliError {
    for entry in &failure.log {
        let _ = write_stderr_line(entry);
    }
    CliError::new(format!("benchmark failed: {}", failure.error))
}

// ============================================================================
// SECTION: Restore and Seed Commands
// ============================================================================

/// JSON output of a restore.
#[derive(Debug, Serialize)]
struct RestoreOutput<'a> {
    /// True when a pending record was reverted.
    restored: bool,
    /// Restoration log.
    log: &'a [String],
}

/// Executes the `restore` command.
fn command_restore(
    format: OutputFormat,
    config: &SiteBenchConfig,
    store: &SqliteBenchStore,
) -> CliResult<ExitCode> {
    let orchestrator = build_orchestrator(config, store, CancelFlag::new())?;
    let report = orchestrator.resume_pending_restore().map_err(|failure| failure_error(&failure))?;
    match format {
        OutputFormat::Json => write_json(&RestoreOutput {
            restored: report.restored,
            log: &report.log,
        })?,
        OutputFormat::Text => {
            for entry in &report.log {
                write_stdout_line(entry).map_err(|err| CliError::new(output_error("stdout", &err)))?;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `seed` command.
fn command_seed(command: &SeedCommand, store: &SqliteBenchStore) -> CliResult<ExitCode> {
    let inserted = store
        .seed_reference_rows(command.rows)
        .map_err(|err| CliError::new(format!("failed to seed reference rows: {err}")))?;
    let total = store
        .reference_row_count()
        .map_err(|err| CliError::new(format!("failed to count reference rows: {err}")))?;
    write_stdout_line(&format!("Inserted {inserted} reference rows ({total} total)."))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Components and Results Commands
// ============================================================================

/// JSON form of an installed component.
#[derive(Debug, Serialize)]
struct ComponentOutput<'a> {
    /// Component identifier.
    id: &'a str,
    /// Whether the component is active.
    active: bool,
}

/// Executes `components` subcommands.
fn command_components(command: &ComponentsCommand, store: &SqliteBenchStore) -> CliResult<ExitCode> {
    match command {
        ComponentsCommand::List(output) => {
            let components = store
                .installed_components()
                .map_err(|err| CliError::new(format!("failed to list components: {err}")))?;
            match output.format {
                OutputFormat::Json => {
                    let rows: Vec<ComponentOutput<'_>> = components
                        .iter()
                        .map(|(id, active)| ComponentOutput {
                            id: id.as_str(),
                            active: *active,
                        })
                        .collect();
                    write_json(&rows)?;
                }
                OutputFormat::Text => {
                    for (id, active) in &components {
                        let state = if *active { "active" } else { "inactive" };
                        write_stdout_line(&format!("{id}\t{state}"))
                            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
                    }
                }
            }
        }
        ComponentsCommand::Register {
            id,
            active,
        } => {
            let component = parse_component(id)?;
            store
                .register_component(&component, *active)
                .map_err(|err| CliError::new(format!("failed to register component: {err}")))?;
            write_stdout_line(&format!("Registered {component}."))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
        ComponentsCommand::Unregister {
            id,
        } => {
            let component = parse_component(id)?;
            let removed = store
                .unregister_component(&component)
                .map_err(|err| CliError::new(format!("failed to unregister component: {err}")))?;
            if !removed {
                return Err(CliError::new(format!("component not installed: {component}")));
            }
            write_stdout_line(&format!("Unregistered {component}."))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `results` subcommands.
fn command_results(command: &ResultsCommand, store: &SqliteBenchStore) -> CliResult<ExitCode> {
    match command {
        ResultsCommand::List {
            limit,
        } => {
            let results = store
                .list_results(*limit)
                .map_err(|err| CliError::new(format!("failed to list results: {err}")))?;
            for (run_id, title) in results {
                write_stdout_line(&format!("{run_id}\t{title}"))
                    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Executes `config` subcommands.
fn command_config(path: Option<PathBuf>, command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => {
            let config = SiteBenchConfig::load(path.as_deref())
                .map_err(|err| CliError::new(format!("config validation failed: {err}")))?;
            let source = config
                .source_path
                .as_ref()
                .map_or_else(|| "defaults".to_string(), |path| path.display().to_string());
            write_stdout_line(&format!(
                "Config valid: {source} ({} profiles).",
                config.profiles.len()
            ))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
        ConfigCommand::Example => {
            let example = config_toml_example();
            write_stdout_line(example.trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a `KIND=PERCENT` intensity argument.
fn parse_intensity_arg(raw: &str) -> Result<(String, i64), String> {
    let (label, value) =
        raw.split_once('=').ok_or_else(|| format!("expected KIND=PERCENT, got {raw:?}"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(format!("missing test kind in {raw:?}"));
    }
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|err| format!("invalid intensity in {raw:?}: {err}"))?;
    Ok((label.to_string(), value))
}

/// Parses a component identifier argument.
fn parse_component(raw: &str) -> CliResult<ComponentId> {
    ComponentId::parse(raw).map_err(|err| CliError::new(format!("invalid component id: {err}")))
}

/// Serializes `value` as pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
