use std::error::Error;
use std::path::PathBuf;

use ccp4_ledger::{export_csv, export_json, Ledger, DEFAULT_TABLE};
use clap::{Args, Subcommand, ValueEnum};

use crate::print_json;

#[derive(Subcommand, Debug)]
pub enum LedgerCommand {
    /// Print every row as JSON.
    List(LedgerArgs),
    /// Write every row to a file.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Ledger file, usually `<run>/extra/coot_ledger.sqlite`.
    #[arg(long)]
    pub ledger: PathBuf,
    #[arg(long, default_value = DEFAULT_TABLE)]
    pub table: String,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: LedgerArgs,
    #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
    pub format: ExportFormat,
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

pub fn run(command: LedgerCommand) -> Result<(), Box<dyn Error>> {
    match command {
        LedgerCommand::List(args) => {
            let ledger = open(&args)?;
            print_json(&ledger.records()?)
        }
        LedgerCommand::Export(args) => {
            let ledger = open(&args.source)?;
            match args.format {
                ExportFormat::Json => export_json(&ledger, &args.out)?,
                ExportFormat::Csv => export_csv(&ledger, &args.out)?,
            }
            println!("{}", args.out.display());
            Ok(())
        }
    }
}

fn open(args: &LedgerArgs) -> Result<Ledger, Box<dyn Error>> {
    if !args.ledger.exists() {
        return Err(format!("no ledger at {}", args.ledger.display()).into());
    }
    let ledger = Ledger::open(&args.ledger, &args.table)?;
    if !ledger.table_exists()? {
        return Err(format!("ledger has no table {}", args.table).into());
    }
    Ok(ledger)
}
