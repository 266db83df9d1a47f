use crate::config::ProviderKind;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "aksnav",
    version,
    about = "Browse AKS cluster inventories, merge credentials and inspect workloads."
)]
pub struct CliArgs {
    /// Config file (defaults to AKSNAV_CONFIG or the usual search paths)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Cluster backend, overrides the config file
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Timeout for a single cluster call in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// tracing filter (for example: info,aksnav=debug)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Write logs to this file; logs are discarded otherwise
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
