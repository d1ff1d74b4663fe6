//! Locating, validating and launching an installed CCP4 suite.

pub mod config;
pub mod environ;
mod install;
mod launcher;
pub mod version;

pub use config::{Ccp4Config, CCP4_HOME_DEFAULT, CCP4_HOME_VARNAME, COOT, PDBSET, REFMAC};
pub use environ::{current_username, resolve_environment, Ccp4Environment};
pub use install::{check_binaries, ensure_installed, validate_installation, BinaryCheck};
pub use launcher::{Invocation, ProgramRunner, SystemRunner};
pub use version::{is_at_least_version, is_exact_version, version_error};

impl Ccp4Config {
    /// Environment for launching programs from this installation.
    pub fn environment(&self) -> Ccp4Environment {
        let username = current_username();
        resolve_environment(&self.home, &username).with_scratch_root(&self.scratch_root, &username)
    }
}
