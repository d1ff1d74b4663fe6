use std::fs;

use ccp4_env::{check_binaries, ensure_installed, validate_installation, Ccp4Config, COOT, PDBSET, REFMAC};
use tempfile::tempdir;

#[test]
fn missing_home_reports_three_lines() {
    let config = Ccp4Config::with_home("/definitely/not/here/ccp4");
    let errors = validate_installation(&config, &[COOT]);
    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0], "Required software not found in the system:");
    assert!(errors[1].ends_with("/definitely/not/here/ccp4"));
}

#[test]
fn reports_each_missing_program() {
    let dir = tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("bin")).expect("bin");
    fs::write(dir.path().join("bin").join(REFMAC), b"#!/bin/sh\n").expect("refmac");
    let config = Ccp4Config::with_home(dir.path());
    let checks = check_binaries(&config, &[REFMAC, PDBSET]);
    assert!(checks[0].installed);
    assert!(!checks[1].installed);
    let errors = validate_installation(&config, &[REFMAC, PDBSET]);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains(PDBSET));
    assert!(ensure_installed(&config, &[REFMAC, PDBSET]).is_err());
    assert!(ensure_installed(&config, &[REFMAC]).is_ok());
}

#[test]
fn config_loads_from_toml() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ccp4.toml");
    fs::write(
        &path,
        "home = \"/opt/ccp4-7.0\"\nviewer = \"/opt/chimerax/bin/ChimeraX\"\n",
    )
    .expect("write");
    let config = Ccp4Config::load(&path).expect("load");
    assert_eq!(config.home, std::path::PathBuf::from("/opt/ccp4-7.0"));
    assert_eq!(config.viewer, std::path::PathBuf::from("/opt/chimerax/bin/ChimeraX"));
    assert_eq!(config.scratch_root, std::path::PathBuf::from("/tmp"));
}

#[test]
fn bad_toml_is_a_serde_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ccp4.toml");
    fs::write(&path, "home = [").expect("write");
    let err = Ccp4Config::load(&path).expect_err("invalid");
    assert_eq!(err.info().code, "ccp4_env.parse_config");
}
