mod common;

use std::fs;

use ccp4_core::{AtomStructRef, HostOutput, RunDir};
use ccp4_env::{PDBSET, REFMAC};
use ccp4_script::RefmacParams;
use ccp4_session::{RefmacJob, RefmacSession};
use common::{fake_install, input_volume, ScriptedRunner};
use tempfile::tempdir;

const LOG: &str = "$TEXT:Result: $$ Final results $$
                      Initial    Final
           R factor    0.3164   0.2712
             R free    0.0000   0.0000
     Rms BondLength    0.0181   0.0093
      Rms BondAngle    1.9386   1.2953
     Rms ChirVolume    0.1117   0.0789
$$
";

#[test]
fn runs_both_drivers_and_registers_refined_model() {
    let dir = tempdir().expect("tempdir");
    let config = fake_install(dir.path(), Some("7.056\n"), &[REFMAC, PDBSET]);
    let volume = input_volume(dir.path(), "emd.map", 1.5, [3.0, 0.0, 0.0]);
    let job = RefmacJob {
        structure: AtomStructRef::new(dir.path().join("model.pdb")),
        volume: Some(volume.clone()),
        params: RefmacParams::default(),
    };
    let run_dir = RunDir::new(dir.path().join("run"), 5);
    let extra = run_dir.extra_dir();
    let runner = ScriptedRunner::new(move |invocation, _| {
        if invocation.program.ends_with("refine_refmac.sh") {
            fs::write(extra.join("refmac-refined.pdb"), "ATOM\n").expect("pdb");
            fs::write(extra.join("refine.log"), LOG).expect("log");
        }
        Ok(())
    });
    let session = RefmacSession::new(run_dir.clone(), job, &config, &runner);
    assert!(session.validate().is_empty());
    assert_eq!(session.summary()[1], "Refmac results are not yet computed");

    let outputs = session.run().expect("run");
    assert_eq!(
        outputs,
        vec![HostOutput::AtomStruct {
            label: "outputPdb".to_string(),
            file_name: run_dir.extra("refmac-refined.pdb"),
            sources: vec![dir.path().join("model.pdb"), volume.file_name.clone()],
        }]
    );

    let runs = runner.runs.borrow();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].program, run_dir.tmp("map2mtz_refmac.sh"));
    assert_eq!(runs[1].program, run_dir.tmp("refine_refmac.sh"));
    assert!(runs.iter().all(|run| run.cwd.as_deref() == Some(run_dir.extra_dir().as_path())));

    let preprocess = fs::read_to_string(run_dir.tmp("map2mtz_refmac.sh")).expect("script");
    assert!(preprocess.contains("CELL 3 3 3 90.0 90.0 90.0"));
    assert!(preprocess.contains("GRID 2 2 2"));
    assert!(preprocess.contains("SFCALC MRADIUS 3"));

    let summary = session.summary();
    assert!(summary[0].starts_with("refmac keywords:"));
    assert!(summary[2].contains("0.3164"));
    assert!(summary[3].contains("0.0093"));
}

#[test]
fn missing_output_is_a_process_error() {
    let dir = tempdir().expect("tempdir");
    let config = fake_install(dir.path(), Some("7.056\n"), &[REFMAC, PDBSET]);
    let mut structure = AtomStructRef::new(dir.path().join("model.pdb"));
    structure.volume = Some(input_volume(dir.path(), "own.map", 1.0, [0.0; 3]));
    let job = RefmacJob {
        structure,
        volume: None,
        params: RefmacParams {
            masked: false,
            ..RefmacParams::default()
        },
    };
    let runner = ScriptedRunner::idle();
    let session = RefmacSession::new(RunDir::new(dir.path().join("run"), 6), job, &config, &runner);
    let err = session.run().expect_err("no output");
    assert_eq!(err.info().code, "ccp4_session.no_refined_pdb");
    assert_eq!(runner.run_count(), 2);
}

#[test]
fn validation_requires_a_volume_and_a_recent_install() {
    let dir = tempdir().expect("tempdir");
    let config = fake_install(dir.path(), None, &[REFMAC]);
    let job = RefmacJob {
        structure: AtomStructRef::new("model.pdb"),
        volume: None,
        params: RefmacParams::default(),
    };
    let runner = ScriptedRunner::idle();
    let session = RefmacSession::new(RunDir::new(dir.path().join("run"), 7), job, &config, &runner);
    assert_eq!(
        session.validate(),
        vec![
            "CCP4 version should be at least 7.0.056".to_string(),
            "Error: You should provide a volume.".to_string(),
        ]
    );
    let install = RefmacSession::<ScriptedRunner>::validate_installation(&config);
    assert_eq!(install.len(), 1);
    assert!(install[0].contains("pdbset"));
    assert!(session.run().is_err());
    assert_eq!(runner.run_count(), 0);
}
