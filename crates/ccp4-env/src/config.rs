use std::fs;
use std::path::{Path, PathBuf};

use ccp4_core::errors::{Ccp4Error, ErrorInfo};
use serde::{Deserialize, Serialize};

/// Environment variable naming the installation root.
pub const CCP4_HOME_VARNAME: &str = "CCP4_HOME";
/// Installation root used when nothing else is configured.
pub const CCP4_HOME_DEFAULT: &str = "/usr/local/ccp4-7.0";
/// Release the bridge was written against.
pub const SUPPORTED_VERSION: &str = "7.0.056";
pub const CCP4_URL: &str = "http://www.ccp4.ac.uk/download";

/// Vendored programs the sessions launch.
pub const COOT: &str = "coot";
pub const REFMAC: &str = "refmac5";
pub const PDBSET: &str = "pdbset";

/// Install configuration, usually read from `ccp4.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ccp4Config {
    /// Installation root, e.g. `/usr/local/ccp4-7.0`.
    #[serde(default = "default_home")]
    pub home: PathBuf,
    /// Molecular viewer used by the viewer glue.
    #[serde(default = "default_viewer")]
    pub viewer: PathBuf,
    /// Parent of the per-user scratch directory.
    #[serde(default = "default_scratch_root")]
    pub scratch_root: PathBuf,
}

fn default_home() -> PathBuf {
    std::env::var_os(CCP4_HOME_VARNAME)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CCP4_HOME_DEFAULT))
}

fn default_viewer() -> PathBuf {
    PathBuf::from("chimerax")
}

fn default_scratch_root() -> PathBuf {
    PathBuf::from("/tmp")
}

impl Default for Ccp4Config {
    fn default() -> Self {
        Self {
            home: default_home(),
            viewer: default_viewer(),
            scratch_root: default_scratch_root(),
        }
    }
}

impl Ccp4Config {
    /// Configuration rooted at `home` with default viewer and scratch.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            ..Self::default()
        }
    }

    /// Defaults, honouring `CCP4_HOME` when set.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Reads a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, Ccp4Error> {
        let contents = fs::read_to_string(path).map_err(|err| {
            Ccp4Error::Serde(
                ErrorInfo::new("ccp4_env.read_config", format!("failed to read config: {err}"))
                    .with_context("path", path.display().to_string()),
            )
        })?;
        toml::from_str(&contents).map_err(|err| {
            Ccp4Error::Serde(
                ErrorInfo::new("ccp4_env.parse_config", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Absolute path of a vendored program: `<home>/bin/<basename>`.
    pub fn program(&self, name: &str) -> PathBuf {
        let base = Path::new(name)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(name));
        self.home.join("bin").join(base)
    }
}
