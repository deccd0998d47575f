use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
use commands::{plugins::PluginsArgs, scan::ScanArgs};

#[derive(Parser)]
#[command(name = "iacscan")]
#[command(about = "Infrastructure-as-code security scanner with pluggable backends")]
#[command(version)]
struct Cli {
    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory or file with one or more backends.
    Scan(ScanArgs),

    /// List the registered scanner backends and their capabilities.
    Plugins(PluginsArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::Scan(args) => runtime.block_on(commands::scan::execute(args)),
        Commands::Plugins(args) => commands::plugins::execute(args),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_directive = if verbose {
        "iacscan=debug,iacscan_engine=debug"
    } else {
        "iacscan=info,iacscan_engine=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
