//! Mimic stub server.
//!
//! Serves responses for the configured contracts, preferring mock exchanges
//! registered at runtime or found beside the contracts.
//!
//! Usage:
//!   mimic-stub --contract orders.contract [--data mocks/] [--port 9000]

use clap::Parser;
use mimic::config::StubConfig;
use mimic::loader::load_stub;
use mimic::stub::{serve, UnmatchedMockPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mimic-stub")]
#[command(author, version, about = "Serve a stub that answers according to contracts")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "MIMIC_CONFIG")]
    config: Option<PathBuf>,

    /// Contract file or directory (repeatable)
    #[arg(long = "contract")]
    contracts: Vec<PathBuf>,

    /// Mock data directory (repeatable)
    #[arg(long = "data")]
    data_dirs: Vec<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Reject object keys the contract does not declare
    #[arg(long)]
    strict_keys: bool,

    /// Fail at startup if any mock matches no contract
    #[arg(long)]
    reject_unmatched_mocks: bool,

    /// Log filter directive, e.g. `debug` or `mimic=trace`
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> anyhow::Result<StubConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                serde_yaml::from_str(&contents)?
            }
            None => StubConfig::default(),
        };
        if !self.contracts.is_empty() {
            config.contracts = self.contracts;
        }
        if !self.data_dirs.is_empty() {
            config.data_dirs = self.data_dirs;
        }
        if let Some(host) = self.host {
            config.listen.host = host;
        }
        if let Some(port) = self.port {
            config.listen.port = port;
        }
        if self.strict_keys {
            config.matching.strict_keys = true;
        }
        if self.reject_unmatched_mocks {
            config.matching.unmatched_mocks = UnmatchedMockPolicy::Reject;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(args.log_level.parse()?))
        .init();

    let config = args.into_config()?;
    let stub = load_stub(&config)?;
    if !stub.diagnostics().is_empty() {
        warn!(
            "{} mock report(s) above: those mocks match no contract and will not be served",
            stub.diagnostics().len()
        );
    }

    let running = serve(Arc::new(stub), &config.listen.host, config.listen.port).await?;
    info!("Mimic stub serving on {}", running.url());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    running.shutdown().await;
    Ok(())
}
