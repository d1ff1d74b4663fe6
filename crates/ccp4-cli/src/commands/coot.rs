use std::error::Error;
use std::path::PathBuf;

use ccp4_core::RunDir;
use ccp4_env::{Ccp4Config, SystemRunner};
use ccp4_session::{CootJob, CootSession};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::{fail_on, load_job, print_json};

#[derive(Subcommand, Debug)]
pub enum CootCommand {
    /// Validate the job, normalize its maps and seed the ledger.
    Init(CootArgs),
    /// Launch coot once, then import what was saved.
    Run(CootArgs),
    /// Import pending ledger rows without launching coot.
    Import(CootArgs),
    /// Show the session state and pending rows.
    Status(CootArgs),
}

#[derive(Args, Debug)]
pub struct CootArgs {
    /// YAML job describing structures, maps and switches.
    #[arg(long)]
    pub job: PathBuf,
    /// Working directory of the run.
    #[arg(long = "run-dir")]
    pub run_dir: PathBuf,
    /// Identifier used in saved model names.
    #[arg(long = "run-id", default_value_t = 1)]
    pub run_id: u64,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    phase: String,
    interactive: bool,
    tool_runs: u32,
    updated_at: String,
    pending_structures: usize,
    pending_volumes: usize,
    finished_by_user: bool,
}

pub fn run(command: CootCommand, config: &Ccp4Config) -> Result<(), Box<dyn Error>> {
    let runner = SystemRunner;
    match command {
        CootCommand::Init(args) => {
            let session = open(&args, config, &runner)?;
            fail_on(CootSession::<SystemRunner>::validate_installation(config))?;
            fail_on(session.validate())?;
            session.convert()?;
            Ok(())
        }
        CootCommand::Run(args) => {
            let session = open(&args, config, &runner)?;
            print_json(&session.run()?)
        }
        CootCommand::Import(args) => {
            let session = open(&args, config, &runner)?;
            print_json(&session.import()?)
        }
        CootCommand::Status(args) => {
            let session = open(&args, config, &runner)?;
            let state = session.state()?;
            let (pending_structures, pending_volumes) = session.pending_counts()?;
            print_json(&StatusReport {
                phase: format!("{:?}", state.phase),
                interactive: state.interactive,
                tool_runs: state.tool_runs,
                updated_at: state.updated_at,
                pending_structures,
                pending_volumes,
                finished_by_user: session.sentinel_path().exists(),
            })
        }
    }
}

fn open<'a>(
    args: &CootArgs,
    config: &'a Ccp4Config,
    runner: &'a SystemRunner,
) -> Result<CootSession<'a, SystemRunner>, Box<dyn Error>> {
    let job: CootJob = load_job(&args.job)?;
    let run_dir = RunDir::new(&args.run_dir, args.run_id);
    Ok(CootSession::new(run_dir, job, config, runner))
}
