//! Per-task working directory owned by the host.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::Ccp4Error;

/// Layout of one task's working directory.
///
/// `extra/` keeps files that must survive a relaunch (scripts, ledger,
/// normalized maps); `tmp/` holds scratch files such as driver scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDir {
    root: PathBuf,
    /// Host-assigned identifier of the task, used in generated file names.
    pub run_id: u64,
}

impl RunDir {
    /// Wraps an existing or future task directory.
    pub fn new(root: impl Into<PathBuf>, run_id: u64) -> Self {
        Self {
            root: root.into(),
            run_id,
        }
    }

    /// Creates `extra/` and `tmp/` if missing.
    pub fn ensure(&self) -> Result<(), Ccp4Error> {
        for dir in [self.extra_dir(), self.tmp_dir()] {
            fs::create_dir_all(&dir).map_err(|err| Ccp4Error::io("ccp4_core.run_dir", &dir, err))?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extra_dir(&self) -> PathBuf {
        self.root.join("extra")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    /// Path of `name` inside `extra/`.
    pub fn extra(&self, name: impl AsRef<Path>) -> PathBuf {
        self.extra_dir().join(name)
    }

    /// Path of `name` inside `tmp/`.
    pub fn tmp(&self, name: impl AsRef<Path>) -> PathBuf {
        self.tmp_dir().join(name)
    }
}
