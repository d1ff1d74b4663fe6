use std::error::Error;
use std::path::PathBuf;

use ccp4_core::RunDir;
use ccp4_env::{Ccp4Config, SystemRunner};
use ccp4_session::{RefmacJob, RefmacSession};
use clap::Args;

use crate::{fail_on, load_job, print_json};

#[derive(Args, Debug)]
pub struct RefmacArgs {
    /// YAML job: structure, optional volume and refinement parameters.
    #[arg(long)]
    pub job: PathBuf,
    /// Working directory of the run.
    #[arg(long = "run-dir")]
    pub run_dir: PathBuf,
    /// Print the results of a previous run instead of refining.
    #[arg(long)]
    pub summary: bool,
}

pub fn run(args: &RefmacArgs, config: &Ccp4Config) -> Result<(), Box<dyn Error>> {
    let job: RefmacJob = load_job(&args.job)?;
    let runner = SystemRunner;
    let session = RefmacSession::new(RunDir::new(&args.run_dir, 0), job, config, &runner);
    if !args.summary {
        fail_on(RefmacSession::<SystemRunner>::validate_installation(config))?;
        fail_on(session.validate())?;
        print_json(&session.run()?)?;
    }
    for line in session.summary() {
        println!("{line}");
    }
    Ok(())
}
