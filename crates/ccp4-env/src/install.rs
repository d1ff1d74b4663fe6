use ccp4_core::errors::{Ccp4Error, ErrorInfo};
use serde::{Deserialize, Serialize};

use crate::config::{Ccp4Config, CCP4_HOME_VARNAME};

/// Outcome of checking one vendored program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryCheck {
    pub name: String,
    pub path: String,
    pub installed: bool,
}

impl BinaryCheck {
    pub fn message(&self) -> String {
        if self.installed {
            format!("{} found at {}", self.name, self.path)
        } else {
            format!("Missing CCP4 program {}: {} does not exist", self.name, self.path)
        }
    }
}

/// Checks that each named program exists under `<home>/bin`.
pub fn check_binaries(config: &Ccp4Config, names: &[&str]) -> Vec<BinaryCheck> {
    names
        .iter()
        .map(|name| {
            let path = config.program(name);
            BinaryCheck {
                name: name.to_string(),
                installed: path.is_file(),
                path: path.display().to_string(),
            }
        })
        .collect()
}

/// Human-readable installation problems; empty when the suite is usable.
pub fn validate_installation(config: &Ccp4Config, programs: &[&str]) -> Vec<String> {
    if !config.home.exists() {
        return vec![
            "Required software not found in the system:".to_string(),
            format!("{CCP4_HOME_VARNAME}: {}", config.home.display()),
            format!(
                "Install CCP4 (see {}) and point {CCP4_HOME_VARNAME} at it",
                crate::config::CCP4_URL
            ),
        ];
    }
    check_binaries(config, programs)
        .into_iter()
        .filter(|check| !check.installed)
        .map(|check| check.message())
        .collect()
}

/// Same checks as [`validate_installation`], as a hard error.
pub fn ensure_installed(config: &Ccp4Config, programs: &[&str]) -> Result<(), Ccp4Error> {
    let problems = validate_installation(config, programs);
    if problems.is_empty() {
        return Ok(());
    }
    Err(Ccp4Error::Install(
        ErrorInfo::new("ccp4_env.install", problems.join("; "))
            .with_context("home", config.home.display().to_string())
            .with_hint(format!("set {CCP4_HOME_VARNAME} or `home` in ccp4.toml")),
    ))
}
