use std::error::Error;
use std::path::PathBuf;

use ccp4_core::RunDir;
use ccp4_env::{Ccp4Config, SystemRunner};
use ccp4_session::{show_coot_session, write_scene, CootJob};
use clap::Args;

use crate::load_job;

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// YAML job of the coot run to show.
    #[arg(long)]
    pub job: PathBuf,
    /// Working directory of the run.
    #[arg(long = "run-dir")]
    pub run_dir: PathBuf,
    /// Write the scene files without starting the viewer.
    #[arg(long = "no-launch")]
    pub no_launch: bool,
}

pub fn run(args: &ViewArgs, config: &Ccp4Config) -> Result<(), Box<dyn Error>> {
    let job: CootJob = load_job(&args.job)?;
    let run_dir = RunDir::new(&args.run_dir, 0);
    let scene = if args.no_launch {
        write_scene(&run_dir, &job)?
    } else {
        show_coot_session(&run_dir, &job, config, &SystemRunner)?
    };
    println!("{}", scene.display());
    Ok(())
}
