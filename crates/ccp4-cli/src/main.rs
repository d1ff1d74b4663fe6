use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use ccp4_core::{from_yaml_slice, to_canonical_json_bytes};
use ccp4_env::Ccp4Config;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use commands::{
    coot::{self, CootCommand},
    doctor::{self, DoctorArgs},
    env::{self, EnvArgs},
    ledger::{self, LedgerCommand},
    refmac::{self, RefmacArgs},
    view::{self, ViewArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "ccp4-bridge", about = "Run CCP4 coot and refmac5 sessions from the shell")]
struct Cli {
    /// TOML install configuration; defaults honour CCP4_HOME.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the CCP4 installation the bridge would use.
    Doctor(DoctorArgs),
    /// Print the environment handed to CCP4 programs.
    Env(EnvArgs),
    /// Interactive model building with coot.
    #[command(subcommand)]
    Coot(CootCommand),
    /// Real-space refinement with refmac5.
    Refmac(RefmacArgs),
    /// Open a coot run's maps and models in the molecular viewer.
    View(ViewArgs),
    /// Inspect a run's output ledger.
    #[command(subcommand)]
    Ledger(LedgerCommand),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Doctor(args) => doctor::run(&args, &config),
        Command::Env(args) => env::run(&args, &config),
        Command::Coot(command) => coot::run(command, &config),
        Command::Refmac(args) => refmac::run(&args, &config),
        Command::View(args) => view::run(&args, &config),
        Command::Ledger(command) => ledger::run(command),
    }
}

fn load_config(path: Option<&Path>) -> Result<Ccp4Config, Box<dyn Error>> {
    match path {
        Some(path) => Ok(Ccp4Config::load(path)?),
        None => Ok(Ccp4Config::from_env()),
    }
}

/// Reads a YAML job file.
pub(crate) fn load_job<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let bytes = fs::read(path)?;
    Ok(from_yaml_slice(&bytes)?)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    let bytes = to_canonical_json_bytes(value)?;
    println!("{}", String::from_utf8(bytes)?);
    Ok(())
}

/// Turns validation lines into an error when there are any.
pub(crate) fn fail_on(problems: Vec<String>) -> Result<(), Box<dyn Error>> {
    if problems.is_empty() {
        return Ok(());
    }
    for problem in &problems {
        eprintln!("{problem}");
    }
    Err(format!("{} validation problem(s)", problems.len()).into())
}
