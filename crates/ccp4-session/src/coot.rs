//! Interactive coot session driven as a resumable state machine.
//!
//! Each host invocation calls [`CootSession::run`] once. The first call
//! converts the inputs and seeds the ledger; every call then launches coot,
//! blocks until it exits and imports whatever the user saved. The session
//! finishes when coot leaves the sentinel file behind, or right after the
//! first launch when it is not interactive.

use std::collections::BTreeSet;
use std::path::PathBuf;

use ccp4_core::errors::{Ccp4Error, ErrorInfo};
use ccp4_core::{file_label, ArtifactKind, AtomStructRef, HostOutput, RunDir, VolumeRef};
use ccp4_env::{
    ensure_installed, validate_installation, version_error, Ccp4Config, Invocation, ProgramRunner,
    COOT,
};
use ccp4_ledger::{Ledger, NewArtifact, DEFAULT_TABLE};
use ccp4_map::convert_map;
use ccp4_script::coot::{CootScriptContext, SCRIPT_NAME, SENTINEL_NAME};
use ccp4_script::write_extension_script;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::importer::{import_pending, ImportContext};
use crate::state::{Phase, SessionState, STATE_FILE};

/// Ledger file inside `extra/`.
pub const LEDGER_FILE: &str = "coot_ledger.sqlite";

fn default_true() -> bool {
    true
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

/// Inputs and switches of one coot session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CootJob {
    /// Structure saved back to the host (model 0).
    pub structure: AtomStructRef,
    /// Reference structures loaded alongside (models 1..n).
    #[serde(default)]
    pub references: Vec<AtomStructRef>,
    /// Maps to load; when empty the structure's own map is used.
    #[serde(default)]
    pub volumes: Vec<VolumeRef>,
    /// Rescale maps by their maximum before loading.
    #[serde(default = "default_true")]
    pub normalize: bool,
    #[serde(default = "default_true")]
    pub interactive: bool,
    /// Python appended to the extension script; runs coot without graphics.
    #[serde(default)]
    pub extra_commands: String,
    /// Passed to coot with `--python`.
    #[serde(default)]
    pub python: String,
    #[serde(default = "default_table")]
    pub table: String,
}

impl CootJob {
    pub fn new(structure: AtomStructRef) -> Self {
        Self {
            structure,
            references: Vec::new(),
            volumes: Vec::new(),
            normalize: true,
            interactive: true,
            extra_commands: String::new(),
            python: String::new(),
            table: default_table(),
        }
    }

    /// Explicit volumes, or else the structure's associated one.
    pub fn input_volumes(&self) -> Vec<VolumeRef> {
        if !self.volumes.is_empty() {
            return self.volumes.clone();
        }
        self.structure.volume.iter().cloned().collect()
    }

    /// Structure to refine followed by the references.
    pub fn input_structures(&self) -> Vec<PathBuf> {
        std::iter::once(&self.structure)
            .chain(&self.references)
            .map(|structure| structure.file_name.clone())
            .collect()
    }
}

/// Location of the normalized copy of `volume` inside `extra/`.
pub fn normalized_path(run_dir: &RunDir, volume: &VolumeRef) -> PathBuf {
    run_dir.extra(format!("{}.mrc", file_label(&volume.file_name)))
}

pub struct CootSession<'a, R: ProgramRunner> {
    run_dir: RunDir,
    job: CootJob,
    config: &'a Ccp4Config,
    runner: &'a R,
}

impl<'a, R: ProgramRunner> CootSession<'a, R> {
    pub fn new(run_dir: RunDir, job: CootJob, config: &'a Ccp4Config, runner: &'a R) -> Self {
        Self {
            run_dir,
            job,
            config,
            runner,
        }
    }

    pub fn job(&self) -> &CootJob {
        &self.job
    }

    pub fn run_dir(&self) -> &RunDir {
        &self.run_dir
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.run_dir.extra(LEDGER_FILE)
    }

    pub fn script_path(&self) -> PathBuf {
        self.run_dir.extra(SCRIPT_NAME)
    }

    pub fn sentinel_path(&self) -> PathBuf {
        self.run_dir.extra(SENTINEL_NAME)
    }

    pub fn state_path(&self) -> PathBuf {
        self.run_dir.root().join(STATE_FILE)
    }

    /// Problems that prevent the session from starting.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(message) = version_error(&self.config.home) {
            errors.push(message);
        }
        if self.job.structure.file_name.as_os_str().is_empty() {
            errors.push("Error: You should provide an atomic structure to refine.".to_string());
        }
        let mut normalized = BTreeSet::new();
        for volume in self.job.input_volumes() {
            let path = normalized_path(&self.run_dir, &volume);
            if !normalized.insert(path.clone()) {
                errors.push(format!(
                    "Error: volume {} would overwrite {}; input volumes need distinct file names.",
                    volume.file_name.display(),
                    path.display()
                ));
            }
        }
        errors
    }

    /// Installation problems for the programs this session launches.
    pub fn validate_installation(config: &Ccp4Config) -> Vec<String> {
        validate_installation(config, &[COOT])
    }

    pub fn open_ledger(&self) -> Result<Ledger, Ccp4Error> {
        Ledger::open(&self.ledger_path(), &self.job.table)
    }

    pub fn state(&self) -> Result<SessionState, Ccp4Error> {
        SessionState::load_or_new(&self.state_path(), self.job.interactive)
    }

    fn import_context(&self) -> ImportContext {
        ImportContext {
            structures: self.job.input_structures(),
            volumes: self
                .job
                .input_volumes()
                .into_iter()
                .map(|volume| {
                    let normalized = normalized_path(&self.run_dir, &volume);
                    (volume, normalized)
                })
                .collect(),
        }
    }

    /// Writes the normalized maps, then seeds the ledger.
    ///
    /// Every map is converted before any row is written, and the seed rows
    /// go in as one batch. Seed rows already present are left alone and
    /// existing normalized maps are reused, so a relaunch after a failure
    /// finishes the job without duplicating rows.
    pub fn convert(&self) -> Result<(), Ccp4Error> {
        self.run_dir.ensure()?;

        let mut seeds = Vec::new();
        for structure in std::iter::once(&self.job.structure).chain(&self.job.references) {
            seeds.push(NewArtifact {
                model_id: seeds.len() as i64,
                file_name: structure.file_name.display().to_string(),
                label_name: file_label(&structure.file_name),
                kind: ArtifactKind::AtomicStructure,
                imported: true,
            });
        }
        for volume in self.job.input_volumes() {
            let normalized = normalized_path(&self.run_dir, &volume);
            if normalized.exists() {
                debug!(path = %normalized.display(), "reusing normalized map");
            } else {
                convert_map(
                    &volume.file_name,
                    &normalized,
                    volume.sampling_rate,
                    volume.origin,
                    self.job.normalize,
                )?;
            }
            seeds.push(NewArtifact {
                model_id: seeds.len() as i64,
                file_name: normalized.display().to_string(),
                label_name: file_label(&normalized),
                kind: ArtifactKind::VolumeMap,
                imported: false,
            });
        }

        let ledger = self.open_ledger()?;
        ledger.ensure_schema()?;
        let existing: BTreeSet<(i64, String, ArtifactKind)> = ledger
            .records()?
            .into_iter()
            .map(|record| (record.model_id, record.file_name, record.kind))
            .collect();
        let missing: Vec<NewArtifact> = seeds
            .into_iter()
            .filter(|seed| !existing.contains(&(seed.model_id, seed.file_name.clone(), seed.kind)))
            .collect();
        if missing.is_empty() {
            debug!("ledger already seeded");
            return Ok(());
        }
        ledger.record_batch(&missing)?;
        info!(rows = missing.len(), "ledger seeded");
        Ok(())
    }

    /// The coot command line for the current script.
    pub fn invocation(&self) -> Invocation {
        let mut invocation = Invocation::new(self.config.program(COOT)).cwd(self.run_dir.extra_dir());
        if !self.job.extra_commands.is_empty() {
            invocation = invocation.arg("--no-graphics");
        }
        invocation = invocation
            .arg("--script")
            .arg(self.script_path().display().to_string());
        if !self.job.python.is_empty() {
            invocation = invocation.arg("--python").arg(self.job.python.clone());
        }
        invocation
    }

    /// Writes the extension script and runs coot until it exits.
    pub fn run_tool(&self) -> Result<(), Ccp4Error> {
        let ctx = CootScriptContext::in_dir(
            &self.run_dir.extra_dir(),
            &self.ledger_path(),
            &self.job.table,
            self.run_dir.run_id,
        );
        {
            // coot writes to the same file, so the connection closes first
            let ledger = self.open_ledger()?;
            write_extension_script(&self.script_path(), &ctx, &ledger, &self.job.extra_commands)?;
        }
        let env = self.config.environment();
        self.runner.run(&self.invocation(), Some(&env))
    }

    /// Imports pending rows; see [`import_pending`].
    pub fn import(&self) -> Result<Vec<HostOutput>, Ccp4Error> {
        if !self.ledger_path().exists() {
            return Ok(Vec::new());
        }
        let ledger = self.open_ledger()?;
        import_pending(&ledger, &self.import_context())
    }

    /// Pending `(structures, volumes)` rows. Never creates the ledger file.
    pub fn pending_counts(&self) -> Result<(usize, usize), Ccp4Error> {
        if !self.ledger_path().exists() {
            return Ok((0, 0));
        }
        let ledger = self.open_ledger()?;
        if !ledger.table_exists()? {
            return Ok((0, 0));
        }
        Ok((
            ledger.count_pending(ArtifactKind::AtomicStructure)?,
            ledger.count_pending(ArtifactKind::VolumeMap)?,
        ))
    }

    /// One host invocation: advance the state machine and return new outputs.
    pub fn run(&self) -> Result<Vec<HostOutput>, Ccp4Error> {
        let state_path = self.state_path();
        self.run_dir.ensure()?;
        let mut state = self.state()?;

        if state.is_finished() {
            info!("session already finished");
            return Ok(Vec::new());
        }

        if matches!(state.phase, Phase::NotStarted | Phase::Converting) {
            ensure_installed(self.config, &[COOT])?;
            let problems = self.validate();
            if !problems.is_empty() {
                let info = ErrorInfo::new("ccp4_session.validate", problems.join("; "))
                    .with_context("home", self.config.home.display().to_string());
                return Err(if version_error(&self.config.home).is_some() {
                    Ccp4Error::Version(info)
                } else {
                    Ccp4Error::Session(info)
                });
            }
            state.transition(Phase::Converting, &state_path)?;
            self.convert()?;
            state.transition(Phase::AwaitingToolExit, &state_path)?;
        }

        if state.phase == Phase::AwaitingToolExit {
            self.run_tool()?;
            state.tool_runs += 1;
            state.transition(Phase::Importing, &state_path)?;
        }

        let outputs = self.import()?;
        if self.sentinel_path().exists() || !state.interactive {
            state.interactive = false;
            state.transition(Phase::Finished, &state_path)?;
        } else {
            state.transition(Phase::AwaitingToolExit, &state_path)?;
        }
        Ok(outputs)
    }
}
