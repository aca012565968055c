mod commands;
mod utils;

use clap::Parser;
use clap_derive::{Parser, Subcommand};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wled_sync_rs::{DEFAULT_SERVICE_TYPE, WledError};

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Browse mDNS and list the controllers that answer the probe
    Scan {
        #[arg(long, default_value = "5")]
        seconds: u64,
        #[arg(long, default_value = DEFAULT_SERVICE_TYPE)]
        service_type: String,
    },
    /// Fetch and decode the sync settings of a device
    Settings {
        #[arg(long)]
        ip: Ipv4Addr,
        /// Print the raw settings script instead of the decoded document
        #[arg(long)]
        raw: bool,
    },
    /// List the available presets
    Presets,
    /// Push a preset to a device
    Apply {
        #[arg(long)]
        ip: Ipv4Addr,
        #[arg(long)]
        preset: String,
        /// Print the form body without sending it
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Parser, Debug)]
struct Params {
    #[clap(long, default_value = "80")]
    port: u16,
    #[clap(long, env = "WLED_PRESETS_DIR", default_value = "presets")]
    presets_dir: PathBuf,
    #[clap(long, env = "WLED_SNAPSHOTS_DIR", default_value = "sync-settings")]
    snapshots_dir: PathBuf,
    /// Treat the chunked framing error after applying as a failure
    #[clap(long)]
    strict_framing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), WledError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let params = Params::parse();

    match &params.command.clone() {
        Commands::Scan {
            seconds,
            service_type,
        } => commands::scan(params, service_type, *seconds).await?,
        Commands::Settings { ip, raw } => commands::show_settings(params, *ip, *raw).await?,
        Commands::Presets => commands::list_presets(params).await?,
        Commands::Apply {
            ip,
            preset,
            dry_run,
        } => commands::apply_preset(params, *ip, preset, *dry_run).await?,
    }

    Ok(())
}
