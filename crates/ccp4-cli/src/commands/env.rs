use std::error::Error;

use ccp4_env::Ccp4Config;
use clap::Args;

use crate::print_json;

#[derive(Args, Debug)]
pub struct EnvArgs {
    /// Layer over the current process environment instead of listing only
    /// the CCP4 variables.
    #[arg(long)]
    pub merged: bool,
    /// Print JSON instead of shell assignments.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &EnvArgs, config: &Ccp4Config) -> Result<(), Box<dyn Error>> {
    let environment = config.environment();
    let vars = if args.merged {
        environment.merge_over(std::env::vars())
    } else {
        environment.merge_over(std::iter::empty::<(String, String)>())
    };
    if args.json {
        return print_json(&vars);
    }
    for (key, value) in vars {
        println!("{key}={value}");
    }
    Ok(())
}
