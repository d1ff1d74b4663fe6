#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use ccp4_core::errors::{Ccp4Error, ErrorInfo};
use ccp4_core::VolumeRef;
use ccp4_env::{Ccp4Config, Ccp4Environment, Invocation, ProgramRunner};
use ccp4_map::DensityMap;

type Behaviour = Box<dyn Fn(&Invocation, usize) -> Result<(), Ccp4Error>>;

/// Runner that records invocations and plays a scripted stand-in for the tool.
pub struct ScriptedRunner {
    pub runs: RefCell<Vec<Invocation>>,
    pub detached: RefCell<Vec<Invocation>>,
    behaviour: Behaviour,
}

impl ScriptedRunner {
    pub fn new(behaviour: impl Fn(&Invocation, usize) -> Result<(), Ccp4Error> + 'static) -> Self {
        Self {
            runs: RefCell::new(Vec::new()),
            detached: RefCell::new(Vec::new()),
            behaviour: Box::new(behaviour),
        }
    }

    pub fn idle() -> Self {
        Self::new(|_, _| Ok(()))
    }

    pub fn run_count(&self) -> usize {
        self.runs.borrow().len()
    }
}

impl ProgramRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation, env: Option<&Ccp4Environment>) -> Result<(), Ccp4Error> {
        assert!(env.is_some(), "tools always get the CCP4 environment");
        let call = self.run_count();
        self.runs.borrow_mut().push(invocation.clone());
        (self.behaviour)(invocation, call)
    }

    fn spawn_detached(
        &self,
        invocation: &Invocation,
        _env: Option<&Ccp4Environment>,
    ) -> Result<(), Ccp4Error> {
        self.detached.borrow_mut().push(invocation.clone());
        Ok(())
    }
}

pub fn process_failure() -> Ccp4Error {
    Ccp4Error::Process(ErrorInfo::new("ccp4_env.exit_status", "coot exited with status 1"))
}

/// A fake installation with the given programs and version marker.
pub fn fake_install(root: &Path, marker: Option<&str>, programs: &[&str]) -> Ccp4Config {
    let home = root.join("ccp4-7.0");
    fs::create_dir_all(home.join("bin")).expect("bin");
    for program in programs {
        fs::write(home.join("bin").join(program), "#!/bin/sh\n").expect("program");
    }
    if let Some(marker) = marker {
        fs::create_dir_all(home.join("lib").join("ccp4")).expect("lib");
        fs::write(home.join("lib").join("ccp4").join("MAJOR_MINOR"), marker).expect("marker");
    }
    Ccp4Config::with_home(home)
}

/// Writes a small ramp map and returns a reference to it.
pub fn input_volume(dir: &Path, name: &str, sampling: f64, origin: [f64; 3]) -> VolumeRef {
    let path: PathBuf = dir.join(name);
    let data = (1..=8).map(|v| v as f32).collect();
    DensityMap::from_data([2, 2, 2], 1.0, data)
        .expect("map")
        .write(&path)
        .expect("write map");
    VolumeRef {
        file_name: path,
        sampling_rate: sampling,
        origin,
        dim: 2,
    }
}
