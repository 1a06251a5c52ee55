//! Mimic contract importer.
//!
//! Synthesises contract text from mock files, one scenario per exchange.
//!
//! Usage:
//!   mimic-import <mock.json | directory>... [--name "Feature name"]

use clap::Parser;
use mimic::loader::{load_mocks, MOCK_EXTENSION};
use mimic::stub::{Mock, MockSource};
use mimic::synthesis::{scenario_from_exchange, to_gherkin_feature};
use mimic::Types;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mimic-import")]
#[command(author, version, about = "Synthesise a contract from recorded exchanges")]
struct Args {
    /// Mock files or directories of mock files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Feature name of the generated contract
    #[arg(short, long, default_value = "Imported contract")]
    name: String,

    /// Write the contract here instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut mocks: Vec<MockSource> = Vec::new();
    for input in &args.inputs {
        if input.is_dir() {
            mocks.extend(load_mocks(input)?);
        } else if input.extension().is_some_and(|ext| ext == MOCK_EXTENSION) {
            let text = std::fs::read_to_string(input)?;
            mocks.push(MockSource::new(input.display().to_string(), Mock::parse(&text)?));
        } else {
            warn!("Ignoring {}: not a mock file", input.display());
        }
    }

    let mut types = Types::new();
    let mut scenarios = Vec::new();
    for MockSource { source, mock } in &mocks {
        let Mock::Http { request, response } = mock else {
            warn!("Skipping {}: message mocks have no HTTP exchange", source);
            continue;
        };
        let name = format!("{} {}", request.method, request.path);
        let (scenario, declared) = scenario_from_exchange(&name, request, response, types)?;
        types = declared;
        scenarios.push(scenario);
    }

    let feature = to_gherkin_feature(&args.name, &scenarios);
    match &args.output {
        Some(path) => std::fs::write(path, feature)?,
        None => print!("{feature}"),
    }
    Ok(())
}
