//! Mimic contract compatibility checker.
//!
//! Verifies that a newer version of a contract can replace an older one
//! without breaking the older contract's consumers.
//!
//! Usage:
//!   mimic-compare <older.contract> <newer.contract>

use clap::Parser;
use mimic::compatibility::{check, ScenarioCompatibility};
use mimic::loader::load_contract;
use std::path::PathBuf;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Parser, Debug)]
#[command(name = "mimic-compare")]
#[command(author, version, about = "Check that a new contract version is backward compatible")]
struct Args {
    /// The contract consumers were built against
    older: PathBuf,

    /// The contract that should replace it
    newer: PathBuf,

    /// Show why each candidate scenario was rejected
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let older = load_contract(&args.older, false)?;
    let newer = load_contract(&args.newer, false)?;

    println!("{BOLD}{CYAN}Mimic Compatibility Check{RESET}");
    println!(
        "{DIM}{} -> {}{RESET}\n",
        args.older.display(),
        args.newer.display()
    );

    let report = check(&older, &newer);
    for result in &report.results {
        match result {
            ScenarioCompatibility::Compatible { scenario, served_by } => {
                println!("{GREEN}✓{RESET} {scenario} {DIM}(served by \"{served_by}\"){RESET}");
            }
            ScenarioCompatibility::Incompatible { scenario, failures } => {
                println!("{RED}✗{RESET} {BOLD}{scenario}{RESET}");
                for (candidate, failure) in failures {
                    if args.verbose || failures.len() == 1 {
                        println!("    {DIM}{candidate}:{RESET} {}", failure.report());
                    }
                }
                if failures.is_empty() {
                    println!("    {DIM}the newer contract has no HTTP scenarios{RESET}");
                }
            }
        }
    }

    let broken = report.incompatible().count();
    println!();
    if broken == 0 {
        println!("{GREEN}{BOLD}The newer contract is backward compatible.{RESET}");
        Ok(())
    } else {
        println!("{RED}{BOLD}{broken} scenario(s) would break existing consumers.{RESET}");
        std::process::exit(1);
    }
}
