//! Binary entry point for the ftree administrative CLI.
#![forbid(unsafe_code)]

mod config;
mod ui;

use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ftree::admin::{open_tree, stats, verify, AdminOpenOptions, VerifyOptions, VerifyStatus};
use ftree::primitives::cache::CacheOptions;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use config::CliConfig;
use ui::{ColorMode, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "ftree",
    version,
    about = "Offline inspection and verification of fractal tree images",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        env = "FTREE_CONFIG",
        value_name = "PATH",
        help = "CLI config file (defaults to <config dir>/ftree/cli.toml)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = ColorMode::Auto,
        help = "When to colour text output"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every structural invariant reachable from the root
    Verify(VerifyCmd),
    /// Summarize the shape of a tree image
    Inspect(InspectCmd),
}

#[derive(Args, Debug)]
struct VerifyCmd {
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    #[arg(
        long,
        overrides_with = "no_keep_going",
        help = "Keep checking after the first needs-repair violation"
    )]
    keep_going: bool,

    #[arg(
        long,
        overrides_with = "keep_going",
        help = "Stop at the first violation even when the config enables keep_going"
    )]
    no_keep_going: bool,

    #[arg(long, overrides_with = "no_verbose", help = "Log every violation as it is found")]
    verbose: bool,

    #[arg(
        long,
        overrides_with = "verbose",
        help = "Do not log violations even when the config enables verbose"
    )]
    no_verbose: bool,

    #[arg(long, help = "Check the root node only")]
    no_recurse: bool,

    #[arg(long, value_name = "N", help = "Node cache capacity")]
    cache_nodes: Option<usize>,

    #[arg(long, value_name = "N", help = "Maximum findings kept in the report")]
    max_findings: Option<usize>,
}

#[derive(Args, Debug)]
struct InspectCmd {
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    #[arg(long, value_name = "N", help = "Node cache capacity")]
    cache_nodes: Option<usize>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

const EXIT_NEEDS_REPAIR: i32 = 2;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32, Box<dyn Error>> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.clone())?;
    let verbose = match &cli.command {
        Command::Verify(cmd) => {
            resolve_flag(cmd.verbose, cmd.no_verbose, config.verify().verbose)
        }
        Command::Inspect(_) => false,
    };
    install_tracing_subscriber(verbose);
    if let Some(path) = config.path() {
        debug!(target: "ftree::cli", path = %path.display(), "cli config");
    }

    let ui = Ui::new(cli.color, cli.format == OutputFormat::Json);
    match &cli.command {
        Command::Verify(cmd) => run_verify(cmd, cli.format, &ui, &config, verbose),
        Command::Inspect(cmd) => run_inspect(cmd, cli.format, &ui, &config),
    }
}

fn install_tracing_subscriber(verbose: bool) {
    let fallback = if verbose { "warn,ftree=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

/// A flag pair wins over the config file, which wins over off.
fn resolve_flag(on: bool, off: bool, file: Option<bool>) -> bool {
    if on {
        true
    } else if off {
        false
    } else {
        file.unwrap_or(false)
    }
}

fn open_options(cache_nodes: Option<usize>) -> AdminOpenOptions {
    let mut opts = AdminOpenOptions::default();
    if let Some(capacity) = cache_nodes {
        opts.cache = CacheOptions { capacity };
    }
    opts
}

fn run_verify(
    cmd: &VerifyCmd,
    format: OutputFormat,
    ui: &Ui,
    config: &CliConfig,
    verbose: bool,
) -> Result<i32, Box<dyn Error>> {
    let defaults = config.verify();
    let opts = VerifyOptions {
        verbose,
        keep_going: resolve_flag(cmd.keep_going, cmd.no_keep_going, defaults.keep_going),
        recurse: !cmd.no_recurse,
        max_findings: cmd
            .max_findings
            .or(defaults.max_findings)
            .unwrap_or(VerifyOptions::default().max_findings),
    };
    let tree = open_tree(&cmd.image, &open_options(cmd.cache_nodes.or(defaults.cache_nodes)))?;

    let mut spinner = ui.progress(&cmd.image);
    let mut on_clean = |_: f32| -> i32 {
        spinner.node_clean();
        0
    };
    let progress: &mut dyn FnMut(f32) -> i32 = &mut on_clean;
    let outcome = verify(&tree, Some(progress), &opts);
    let run = spinner.finish();
    let report = outcome?;

    emit(format, &report, || ui.print_report(&report, &run))?;
    Ok(match report.status {
        VerifyStatus::Clean => 0,
        VerifyStatus::NeedsRepair | VerifyStatus::Aborted { .. } => EXIT_NEEDS_REPAIR,
    })
}

fn run_inspect(
    cmd: &InspectCmd,
    format: OutputFormat,
    ui: &Ui,
    config: &CliConfig,
) -> Result<i32, Box<dyn Error>> {
    let cache_nodes = cmd.cache_nodes.or(config.verify().cache_nodes);
    let tree = open_tree(&cmd.image, &open_options(cache_nodes))?;
    let summary = stats(&tree)?;
    emit(format, &summary, || ui.print_stats(&summary))?;
    Ok(0)
}

fn emit<T, F>(format: OutputFormat, value: &T, print_text: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => print_text(),
    }
    Ok(())
}
