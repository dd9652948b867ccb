//! nf-cpuinfo: exercise the cpuinfo node features engine from the shell.
//!
//! - `scan` parses cpuinfo files and prints each one's feature list
//! - `state` runs the host `node_state` call against the configured source
//! - `xlate`, `job-xlate`, `owned` and `reorder` expose the list operations
//! - `pci-table` lists the recognized PCI devices (built with `pci`)

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use nf_common::{Error, OutputFormat};
use nf_config::{load_config, ConfigSource, EngineConfig, ValidationError};
use nf_core::cpuinfo::CpuFeatureExtractor;
use nf_core::exit_codes::ExitCode;
use nf_core::features::{is_owned, job_xlate, render, reorder, xlate};
use nf_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogFormat, LogLevel, Stage,
};
use nf_core::plugin::{CpuinfoPlugin, NodeFeaturesPlugin};
use serde_json::json;
use tracing::{debug, info, info_span, warn};

#[derive(Parser)]
#[command(name = "nf-cpuinfo")]
#[command(author, version, about = "cpuinfo node features: extract, render, reconcile")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Engine config file (default: resolved from env, XDG, /etc)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr: human or jsonl
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse cpuinfo files and print `<path>:    <features>` for each
    Scan(ScanArgs),

    /// Append this node's features to available/active lists
    State(StateArgs),

    /// Merge new features into an original list
    Xlate(XlateArgs),

    /// Keep only owned features of an `&`-joined job constraint
    JobXlate {
        /// Job constraint expression
        expr: String,
    },

    /// Exit 0 if TOKEN is an owned feature, 2 otherwise
    Owned {
        token: String,
    },

    /// Apply the reordering policy to a feature list
    Reorder {
        list: String,
    },

    /// List the recognized PCI vendors and devices
    PciTable,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// cpuinfo-formatted files
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct StateArgs {
    /// Existing available features
    #[arg(long)]
    avail: Option<String>,

    /// Existing active features
    #[arg(long)]
    active: Option<String>,
}

#[derive(Args, Debug)]
struct XlateArgs {
    /// Freshly computed features
    #[arg(long)]
    new: Option<String>,

    /// Current node feature list
    #[arg(long)]
    orig: Option<String>,

    /// Available features (does not affect the result)
    #[arg(long)]
    avail: Option<String>,
}

impl Commands {
    fn stage(&self) -> Stage {
        match self {
            Commands::Scan(_) | Commands::State(_) => Stage::Extract,
            Commands::PciTable => Stage::Pci,
            _ => Stage::Reconcile,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Commands::Scan(_) => "scan",
            Commands::State(_) => "state",
            Commands::Xlate(_) => "xlate",
            Commands::JobXlate { .. } => "job-xlate",
            Commands::Owned { .. } => "owned",
            Commands::Reorder { .. } => "reorder",
            Commands::PciTable => "pci-table",
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version land here too.
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else if cli.global.verbose > 0 {
        Some(LogLevel::from_verbosity(cli.global.verbose))
    } else {
        None
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let span = info_span!(
        "run",
        run_id = %generate_run_id(),
        stage = %cli.command.stage()
    );
    let _guard = span.enter();
    info!(event = event_names::RUN_STARTED, command = cli.command.name(), "nf-cpuinfo started");

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(err) => report_error(&cli.global, &err),
    };

    info!(
        event = event_names::RUN_FINISHED,
        exit_code = exit_code.as_i32(),
        "nf-cpuinfo finished"
    );
    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    let global = &cli.global;
    match &cli.command {
        Commands::Scan(args) => run_scan(global, &load_engine_config(global)?, args),
        Commands::State(args) => run_state(global, load_engine_config(global)?, args),
        Commands::Xlate(args) => {
            let merged = xlate(
                args.new.as_deref(),
                args.orig.as_deref(),
                args.avail.as_deref(),
            );
            emit_list(global, "features", merged.as_deref())?;
            Ok(ExitCode::Clean)
        }
        Commands::JobXlate { expr } => {
            emit_list(global, "features", job_xlate(Some(expr)).as_deref())?;
            Ok(ExitCode::Clean)
        }
        Commands::Owned { token } => {
            let owned = is_owned(token);
            match global.format {
                OutputFormat::Text => println!("{}", owned),
                OutputFormat::Json => print_json(&json!({ "token": token, "owned": owned }))?,
            }
            Ok(if owned {
                ExitCode::Clean
            } else {
                ExitCode::Negative
            })
        }
        Commands::Reorder { list } => {
            emit_list(global, "features", reorder(Some(list)).as_deref())?;
            Ok(ExitCode::Clean)
        }
        Commands::PciTable => run_pci_table(global),
    }
}

fn load_engine_config(global: &GlobalOpts) -> Result<EngineConfig, Error> {
    match load_config(global.config.as_deref()) {
        Ok((config, resolved)) => {
            if resolved.source == ConfigSource::BuiltinDefault {
                debug!(event = event_names::CONFIG_DEFAULT_USED, "no config file found");
            } else {
                info!(
                    event = event_names::CONFIG_LOADED,
                    source = %resolved.source,
                    path = ?resolved.path,
                    "config loaded"
                );
            }
            Ok(config)
        }
        Err(err) => {
            warn!(event = event_names::CONFIG_ERROR, error = %err, "config rejected");
            Err(match err {
                ValidationError::IoError(msg) => Error::Config(msg),
                other => Error::InvalidConfig(other.to_string()),
            })
        }
    }
}

fn run_scan(
    global: &GlobalOpts,
    config: &EngineConfig,
    args: &ScanArgs,
) -> Result<ExitCode, Error> {
    let extractor = CpuFeatureExtractor::new().with_chunk_size(config.chunk_size);
    let pci = scan_pci_features(config);
    let mut failures = 0usize;

    for path in &args.paths {
        let outcome = extractor.extract_file(path);
        if let Err(err) = &outcome {
            failures += 1;
            warn!(
                event = event_names::EXTRACT_FAILED,
                path = %path.display(),
                error = %err,
                "skipping unreadable file"
            );
        }
        let rendered = scan_features(&outcome, pci.as_deref());

        match global.format {
            OutputFormat::Text => {
                println!("{}:    {}", path.display(), rendered.as_deref().unwrap_or(""));
            }
            OutputFormat::Json => print_json(&scan_record(path, &outcome, rendered.as_deref()))?,
        }
    }

    Ok(if failures == 0 {
        ExitCode::Clean
    } else {
        ExitCode::PartialFail
    })
}

/// Feature list for one scanned file. An unreadable file still reports the
/// node's PCI features.
fn scan_features(
    outcome: &Result<nf_core::CpuFeatures, Error>,
    pci: Option<&str>,
) -> Option<String> {
    match outcome {
        Ok(features) => render(features, pci),
        Err(_) => pci.filter(|p| !p.is_empty()).map(str::to_string),
    }
}

fn scan_record(
    path: &Path,
    outcome: &Result<nf_core::CpuFeatures, Error>,
    rendered: Option<&str>,
) -> serde_json::Value {
    match outcome {
        Ok(features) => json!({
            "path": path,
            "features": rendered,
            "record": features,
        }),
        Err(err) => json!({
            "path": path,
            "features": rendered,
            "error": err.to_json(),
        }),
    }
}

#[cfg(feature = "pci")]
fn scan_pci_features(config: &EngineConfig) -> Option<String> {
    CpuinfoPlugin::new(config.clone()).pci_features()
}

#[cfg(not(feature = "pci"))]
fn scan_pci_features(_config: &EngineConfig) -> Option<String> {
    None
}

fn run_state(
    global: &GlobalOpts,
    config: EngineConfig,
    args: &StateArgs,
) -> Result<ExitCode, Error> {
    let plugin = CpuinfoPlugin::new(config);
    plugin.init()?;

    let mut avail = args.avail.clone();
    let mut active = args.active.clone();
    plugin.node_state(&mut avail, &mut active);
    let populated = plugin.cache().is_populated();
    plugin.fini()?;

    match global.format {
        OutputFormat::Text => {
            println!("avail:  {}", avail.as_deref().unwrap_or(""));
            println!("active: {}", active.as_deref().unwrap_or(""));
        }
        OutputFormat::Json => print_json(&json!({
            "plugin": plugin.plugin_type(),
            "avail": avail,
            "active": active,
            "parsed": populated,
        }))?,
    }

    Ok(if populated {
        ExitCode::Clean
    } else {
        ExitCode::PartialFail
    })
}

#[cfg(feature = "pci")]
fn run_pci_table(global: &GlobalOpts) -> Result<ExitCode, Error> {
    use nf_core::pci::PciVendorTable;

    let table = PciVendorTable::builtin();
    match global.format {
        OutputFormat::Text => print!("{}", table.summary()),
        OutputFormat::Json => {
            let vendors: Vec<_> = table
                .vendors()
                .iter()
                .map(|vendor| {
                    json!({
                        "vendor_id": format!("0x{:04X}", vendor.vendor_id),
                        "devices": vendor.devices.iter().map(|d| json!({
                            "device_id": format!("0x{:04X}", d.device_id),
                            "feature": d.feature,
                        })).collect::<Vec<_>>(),
                    })
                })
                .collect();
            print_json(&json!({ "vendors": vendors }))?;
        }
    }
    Ok(ExitCode::Clean)
}

#[cfg(not(feature = "pci"))]
fn run_pci_table(_global: &GlobalOpts) -> Result<ExitCode, Error> {
    Err(Error::PciUnavailable)
}

fn emit_list(global: &GlobalOpts, key: &str, list: Option<&str>) -> Result<(), Error> {
    match global.format {
        OutputFormat::Text => println!("{}", list.unwrap_or("")),
        OutputFormat::Json => print_json(&json!({ key: list }))?,
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<(), Error> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn report_error(global: &GlobalOpts, err: &Error) -> ExitCode {
    match global.format {
        OutputFormat::Text => eprintln!("nf-cpuinfo: {}", err),
        OutputFormat::Json => println!("{}", json!({ "error": err.to_json() })),
    }
    ExitCode::for_error(err)
}
