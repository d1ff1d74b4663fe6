//! Batch refinement with refmac5: convert, build drivers, run, register.

use std::fs;
use std::path::{Path, PathBuf};

use ccp4_core::errors::{Ccp4Error, ErrorInfo};
use ccp4_core::{AtomStructRef, HostOutput, RunDir, VolumeRef};
use ccp4_env::{
    ensure_installed, validate_installation, version_error, Ccp4Config, Invocation, ProgramRunner,
    PDBSET, REFMAC,
};
use ccp4_map::{convert_map, MapHeader};
use ccp4_script::refmac::{
    write_executable, LOCAL_MAP, PREPROCESS_SCRIPT, REFINED_PDB, REFINE_LOG, REFINE_SCRIPT,
};
use ccp4_script::{parameter_map, preprocess_script, refine_script, RefmacInputs, RefmacParams};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Output name of the refined structure.
pub const OUTPUT_LABEL: &str = "outputPdb";
pub const KEYWORDS_URL: &str =
    "https://www2.mrc-lmb.cam.ac.uk/groups/murshudov/content/refmac/refmac_keywords.html";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefmacJob {
    pub structure: AtomStructRef,
    /// Map to refine against; the structure's own map when absent.
    #[serde(default)]
    pub volume: Option<VolumeRef>,
    #[serde(default)]
    pub params: RefmacParams,
}

impl RefmacJob {
    pub fn input_volume(&self) -> Option<&VolumeRef> {
        self.volume.as_ref().or(self.structure.volume.as_ref())
    }
}

pub struct RefmacSession<'a, R: ProgramRunner> {
    run_dir: RunDir,
    job: RefmacJob,
    config: &'a Ccp4Config,
    runner: &'a R,
}

impl<'a, R: ProgramRunner> RefmacSession<'a, R> {
    pub fn new(run_dir: RunDir, job: RefmacJob, config: &'a Ccp4Config, runner: &'a R) -> Self {
        Self {
            run_dir,
            job,
            config,
            runner,
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(message) = version_error(&self.config.home) {
            errors.push(message);
        }
        if self.job.input_volume().is_none() {
            errors.push("Error: You should provide a volume.".to_string());
        }
        errors
    }

    pub fn validate_installation(config: &Ccp4Config) -> Vec<String> {
        validate_installation(config, &[REFMAC, PDBSET])
    }

    pub fn local_map(&self) -> PathBuf {
        self.run_dir.extra(LOCAL_MAP)
    }

    pub fn log_path(&self) -> PathBuf {
        self.run_dir.extra(REFINE_LOG)
    }

    fn volume(&self) -> Result<&VolumeRef, Ccp4Error> {
        self.job.input_volume().ok_or_else(|| {
            Ccp4Error::Session(
                ErrorInfo::new("ccp4_session.no_volume", "refinement needs a volume")
                    .with_hint("set `volume` or attach a map to the structure"),
            )
        })
    }

    /// Copies the input map into `extra/` with origin and sampling stamped.
    pub fn convert_input(&self) -> Result<(), Ccp4Error> {
        let volume = self.volume()?;
        convert_map(
            &volume.file_name,
            &self.local_map(),
            volume.sampling_rate,
            volume.origin,
            false,
        )?;
        Ok(())
    }

    /// Driver inputs read from the local map header and the installation.
    pub fn driver_inputs(&self) -> Result<RefmacInputs, Ccp4Error> {
        let header = MapHeader::read(&self.local_map())?;
        Ok(RefmacInputs {
            ccp4_home: self.config.home.clone(),
            refmac_bin: self.config.program(REFMAC),
            pdbset_bin: self.config.program(PDBSET),
            structure: self.job.structure.file_name.clone(),
            map_file: self.local_map(),
            output_dir: self.run_dir.extra_dir(),
            cell: header.cell_dimensions(),
            grid: header.grid_sampling(),
        })
    }

    fn run_script(&self, path: &Path) -> Result<(), Ccp4Error> {
        let env = self.config.environment();
        let invocation = Invocation::new(path).cwd(self.run_dir.extra_dir());
        self.runner.run(&invocation, Some(&env))
    }

    /// Runs every step and returns the refined structure.
    pub fn run(&self) -> Result<Vec<HostOutput>, Ccp4Error> {
        ensure_installed(self.config, &[REFMAC, PDBSET])?;
        if let Some(message) = version_error(&self.config.home) {
            return Err(Ccp4Error::Version(ErrorInfo::new("ccp4_session.version", message)));
        }
        self.run_dir.ensure()?;
        let volume = self.volume()?.clone();

        self.convert_input()?;
        let values = parameter_map(&self.job.params, &self.driver_inputs()?);
        let masked = self.job.params.masked;

        let preprocess = self.run_dir.tmp(PREPROCESS_SCRIPT);
        write_executable(&preprocess, &preprocess_script(masked, &values)?)?;
        info!(masked, "running map to mtz");
        self.run_script(&preprocess)?;

        let refine = self.run_dir.tmp(REFINE_SCRIPT);
        write_executable(&refine, &refine_script(masked, &values)?)?;
        info!(cycles = self.job.params.cycles, "running refinement");
        self.run_script(&refine)?;

        let refined = self.run_dir.extra(REFINED_PDB);
        if !refined.exists() {
            return Err(Ccp4Error::Process(
                ErrorInfo::new("ccp4_session.no_refined_pdb", "refmac produced no refined structure")
                    .with_context("expected", refined.display().to_string())
                    .with_hint(format!("see {}", self.log_path().display())),
            ));
        }
        Ok(vec![HostOutput::AtomStruct {
            label: OUTPUT_LABEL.to_string(),
            file_name: refined,
            sources: vec![self.job.structure.file_name.clone(), volume.file_name],
        }])
    }

    /// Human-readable results read from the refinement log.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![format!("refmac keywords: {KEYWORDS_URL}")];
        match fs::read_to_string(self.log_path())
            .ok()
            .and_then(|text| RefmacSummary::parse(&text))
        {
            Some(summary) => lines.extend(summary.lines()),
            None => lines.push("Refmac results are not yet computed".to_string()),
        }
        lines
    }
}

/// Initial and final statistics from the log's final results block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefmacSummary {
    pub r_factor: (f64, f64),
    pub rms_bond_length: (f64, f64),
    pub rms_bond_angle: (f64, f64),
    pub rms_chir_volume: (f64, f64),
}

impl RefmacSummary {
    /// Parses the `$TEXT:Result: $$ Final results $$` block of a refmac log.
    ///
    /// Rows are matched by name, so extra rows such as `R free` are skipped.
    pub fn parse(log: &str) -> Option<Self> {
        let mut lines = log.lines();
        lines.find(|line| {
            let mut words = line.split_whitespace();
            words.next() == Some("$TEXT:Result:") && words.next() == Some("$$")
        })?;

        let mut r_factor = None;
        let mut bond_length = None;
        let mut bond_angle = None;
        let mut chir_volume = None;
        for line in lines {
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.first() == Some(&"$$") {
                break;
            }
            if words.len() < 4 {
                continue;
            }
            let (name, values) = words.split_at(words.len() - 2);
            let pair = match (values[0].parse::<f64>(), values[1].parse::<f64>()) {
                (Ok(initial), Ok(last)) => (initial, last),
                _ => continue,
            };
            match name.join(" ").as_str() {
                "R factor" => r_factor = Some(pair),
                "Rms BondLength" => bond_length = Some(pair),
                "Rms BondAngle" => bond_angle = Some(pair),
                "Rms ChirVolume" => chir_volume = Some(pair),
                _ => {}
            }
        }
        Some(Self {
            r_factor: r_factor?,
            rms_bond_length: bond_length?,
            rms_bond_angle: bond_angle?,
            rms_chir_volume: chir_volume?,
        })
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            "Refmac results:         Initial             Final".to_string(),
            format!(
                "R factor:                  {:.4}           {:.4}    (Goal: ~ 0.3)",
                self.r_factor.0, self.r_factor.1
            ),
            format!(
                "Rms BondLength:    {:.4}           {:.4}    (Goal: ~ 0.02)",
                self.rms_bond_length.0, self.rms_bond_length.1
            ),
            format!(
                "Rms BondAngle:      {:.4}          {:.4}",
                self.rms_bond_angle.0, self.rms_bond_angle.1
            ),
            format!(
                "Rms ChirVolume:    {:.4}           {:.4}",
                self.rms_chir_volume.0, self.rms_chir_volume.1
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "
 Refmac: End of Refinement
$TEXT:Result: $$ Final results $$
                      Initial    Final
           R factor    0.3164   0.2712
             R free    0.0000   0.0000
     Rms BondLength    0.0181   0.0093
      Rms BondAngle    1.9386   1.2953
     Rms ChirVolume    0.1117   0.0789
$$
";

    #[test]
    fn parses_final_results_by_name() {
        let summary = RefmacSummary::parse(LOG).expect("summary");
        assert_eq!(summary.r_factor, (0.3164, 0.2712));
        assert_eq!(summary.rms_bond_length, (0.0181, 0.0093));
        assert_eq!(summary.rms_bond_angle, (1.9386, 1.2953));
        assert_eq!(summary.rms_chir_volume, (0.1117, 0.0789));
        assert!(summary.lines()[1].contains("0.3164"));
    }

    #[test]
    fn missing_block_is_none() {
        assert!(RefmacSummary::parse("no results here\n").is_none());
        assert!(RefmacSummary::parse("$TEXT:Result: $$ Final results $$\n R factor 0.3 0.2\n$$\n").is_none());
    }
}
