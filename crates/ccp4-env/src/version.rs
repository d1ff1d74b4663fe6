//! Version gate driven by the vendor's `MAJOR_MINOR` marker file.
//!
//! The minor part is compared as a float, not as a dotted version: the
//! marker `7.056` yields minor `56.0`, and a marker `7.1` yields `1.0`.
//! Installed suites have always been gated this way, so the rule is kept.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Minimum release accepted by both sessions.
pub const REQUIRED_MAJOR: i64 = 7;
pub const REQUIRED_MINOR: f64 = 0.056;

/// Location of the marker inside an installation.
pub fn marker_path(install_root: &Path) -> PathBuf {
    install_root.join("lib").join("ccp4").join("MAJOR_MINOR")
}

/// Parses the first line of a marker into `(major, minor)`.
pub fn parse_marker(contents: &str) -> Option<(i64, f64)> {
    let line = contents.lines().next()?;
    let (major, minor) = line.split_once('.')?;
    let major = major.trim().parse::<i64>().ok()?;
    let minor = minor.trim().parse::<f64>().ok()?;
    Some((major, minor))
}

fn read_marker(install_root: &Path) -> Option<(i64, f64)> {
    let path = marker_path(install_root);
    let contents = fs::read_to_string(&path).ok()?;
    let parsed = parse_marker(&contents);
    debug!(path = %path.display(), ?parsed, "read version marker");
    parsed
}

/// Whether the installed suite is at least `major.minor`. Fails closed.
pub fn is_at_least_version(install_root: &Path, required_major: i64, required_minor: f64) -> bool {
    match read_marker(install_root) {
        Some((major, minor)) => {
            major > required_major || (major == required_major && minor >= required_minor)
        }
        None => false,
    }
}

/// Whether the installed suite is exactly `major.minor`. Fails closed.
pub fn is_exact_version(install_root: &Path, required_major: i64, required_minor: f64) -> bool {
    match read_marker(install_root) {
        Some((major, minor)) => major == required_major && minor == required_minor,
        None => false,
    }
}

/// Validation line reported when the gate fails, if it fails.
pub fn version_error(install_root: &Path) -> Option<String> {
    if is_at_least_version(install_root, REQUIRED_MAJOR, REQUIRED_MINOR) {
        None
    } else {
        Some(format!(
            "CCP4 version should be at least {}",
            crate::config::SUPPORTED_VERSION
        ))
    }
}
