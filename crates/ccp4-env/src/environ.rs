//! Process environment expected by the vendored CCP4 binaries.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

/// Stale root that must never leak from the caller's environment.
pub const MASTER_VARNAME: &str = "CCP4_MASTER";

/// Resolved variables, split by how they combine with the ambient environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ccp4Environment {
    /// Path lists prepended to any existing value (`PATH`, `LD_LIBRARY_PATH`).
    pub prepend: BTreeMap<String, String>,
    /// Variables that replace any existing value.
    pub replace: BTreeMap<String, String>,
}

fn join(root: &Path, parts: &[&str]) -> String {
    let mut path = root.to_path_buf();
    for part in parts {
        path.push(part);
    }
    path.display().to_string()
}

/// Derives the CCP4 environment from the installation root.
///
/// Pure path construction; nothing is checked on disk.
pub fn resolve_environment(install_root: &Path, username: &str) -> Ccp4Environment {
    let master = install_root
        .parent()
        .map(|parent| parent.display().to_string())
        .unwrap_or_default();

    let mut prepend = BTreeMap::new();
    prepend.insert("PATH".to_string(), join(install_root, &["bin"]));
    prepend.insert("LD_LIBRARY_PATH".to_string(), join(install_root, &["lib"]));

    let entries = [
        (MASTER_VARNAME, master),
        ("CCP4", install_root.display().to_string()),
        ("CCP4_SCR", join(Path::new("/tmp"), &[username])),
        ("GFORTRAN_UNBUFFERED_PRECONNECTED", "Y".to_string()),
        ("CBIN", join(install_root, &["bin"])),
        ("CLIB", join(install_root, &["lib"])),
        ("CLIBD", join(install_root, &["lib", "data"])),
        ("CETC", join(install_root, &["etc"])),
        ("CINCL", join(install_root, &["include"])),
        ("CHTML", join(install_root, &["html"])),
        ("CEXAM", join(install_root, &["examples"])),
        ("CCP4I_TOP", join(install_root, &["share", "ccp4i"])),
        ("MMCIFDIC", join(install_root, &["lib", "cif_mmdic.lib"])),
        // refmac wants the trailing slash on both of these
        ("CLIBD_MON", format!("{}/", join(install_root, &["lib", "data", "monomers"]))),
        ("CRANK", join(install_root, &["crank"])),
        ("CCP4_HELPDIR", format!("{}/", join(install_root, &["help"]))),
    ];
    let replace = entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();

    Ccp4Environment { prepend, replace }
}

/// Name of the user running the host, for the scratch directory.
pub fn current_username() -> String {
    ["USER", "LOGNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|name| !name.is_empty()))
        .unwrap_or_else(|| "ccp4".to_string())
}

impl Ccp4Environment {
    /// Resolves with a custom scratch parent instead of `/tmp`.
    pub fn with_scratch_root(mut self, scratch_root: &Path, username: &str) -> Self {
        self.replace
            .insert("CCP4_SCR".to_string(), join(scratch_root, &[username]));
        self
    }

    /// Final environment obtained by layering this one over `ambient`.
    pub fn merge_over<I, K, V>(&self, ambient: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged: BTreeMap<String, String> = ambient
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        merged.remove(MASTER_VARNAME);
        for (key, value) in &self.prepend {
            let combined = match merged.get(key) {
                Some(existing) if !existing.is_empty() => format!("{value}:{existing}"),
                _ => value.clone(),
            };
            merged.insert(key.clone(), combined);
        }
        for (key, value) in &self.replace {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Applies the environment to a command about to be spawned.
    pub fn apply(&self, cmd: &mut Command) {
        cmd.env_remove(MASTER_VARNAME);
        for (key, value) in &self.prepend {
            let combined = match std::env::var_os(key) {
                Some(existing) if !existing.is_empty() => {
                    let mut joined = OsString::from(value);
                    joined.push(":");
                    joined.push(existing);
                    joined
                }
                _ => OsString::from(value),
            };
            cmd.env(key, combined);
        }
        for (key, value) in &self.replace {
            cmd.env(key, value);
        }
    }
}
