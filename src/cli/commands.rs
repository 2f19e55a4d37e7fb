use clap::{Args, Parser, Subcommand};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SITESCAN_GIT_HASH"),
    ", built ",
    env!("SITESCAN_BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "sitescan",
    version,
    long_version = LONG_VERSION,
    about = "Web vulnerability scan orchestrator"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a web application
    Scan(ScanArgs),
    /// Check that the scanning engine is reachable
    Probe(ProbeArgs),
    /// List recent scans
    History(HistoryArgs),
    /// Run the engine relay server
    Serve(ServeArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct ScanArgs {
    /// Target URL (https:// is assumed when no scheme is given)
    pub url: String,

    /// Crawl first, then scan recursively
    #[arg(long)]
    pub full: bool,

    /// Print findings as JSON
    #[arg(long)]
    pub json: bool,

    /// Relay base URL (overrides config and SITESCAN_RELAY_URL)
    #[arg(long)]
    pub relay: Option<String>,

    /// Do not record this scan in the history store
    #[arg(long)]
    pub no_history: bool,
}

#[derive(Args, Clone)]
pub struct ProbeArgs {
    /// Relay base URL (overrides config and SITESCAN_RELAY_URL)
    #[arg(long)]
    pub relay: Option<String>,
}

#[derive(Args, Clone)]
pub struct HistoryArgs {
    /// Number of entries to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Listen port (overrides config and PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Listen address
    #[arg(long)]
    pub host: Option<String>,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    pub config: String,
}
