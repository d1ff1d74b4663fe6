use std::error::Error;

use ccp4_env::{check_binaries, version_error, Ccp4Config, COOT, PDBSET, REFMAC};
use clap::Args;
use serde::Serialize;

use crate::print_json;

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Emit only JSON without additional context.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: String,
    ok: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    status: String,
    home: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(args: &DoctorArgs, config: &Ccp4Config) -> Result<(), Box<dyn Error>> {
    let report = diagnose(config);
    if !args.quiet {
        println!("ccp4-bridge doctor status: {}", report.status);
    }
    print_json(&report)?;
    if report.status != "ok" {
        return Err("one or more checks failed".into());
    }
    Ok(())
}

fn diagnose(config: &Ccp4Config) -> DoctorReport {
    let mut checks = vec![DoctorCheck {
        name: "home".to_string(),
        ok: config.home.is_dir(),
        detail: config.home.display().to_string(),
    }];
    checks.extend(
        check_binaries(config, &[COOT, REFMAC, PDBSET])
            .into_iter()
            .map(|check| DoctorCheck {
                ok: check.installed,
                detail: check.message(),
                name: check.name,
            }),
    );
    let version = version_error(&config.home);
    checks.push(DoctorCheck {
        name: "version".to_string(),
        ok: version.is_none(),
        detail: version.unwrap_or_else(|| "at least 7.0.056".to_string()),
    });

    let status = if checks.iter().all(|check| check.ok) {
        "ok"
    } else {
        "fail"
    };
    DoctorReport {
        status: status.to_string(),
        home: config.home.display().to_string(),
        checks,
    }
}
