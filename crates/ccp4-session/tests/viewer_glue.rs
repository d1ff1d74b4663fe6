mod common;

use std::fs;

use ccp4_core::{AtomStructRef, RunDir};
use ccp4_env::COOT;
use ccp4_session::{show_coot_session, CootJob, CootSession};
use common::{fake_install, input_volume, ScriptedRunner};
use tempfile::tempdir;

#[test]
fn scene_lists_maps_then_imported_models() {
    let dir = tempdir().expect("tempdir");
    let config = fake_install(dir.path(), Some("7.056\n"), &[COOT]);
    let mut job = CootJob::new(AtomStructRef::new(dir.path().join("model.pdb")));
    job.volumes = vec![input_volume(dir.path(), "emd.map", 2.0, [1.0, 2.0, 3.0])];
    job.interactive = false;
    let run_dir = RunDir::new(dir.path().join("run"), 1);

    let runner = ScriptedRunner::idle();
    CootSession::new(run_dir.clone(), job.clone(), &config, &runner)
        .run()
        .expect("run");

    let scene = show_coot_session(&run_dir, &job, &config, &runner).expect("viewer");
    let text = fs::read_to_string(&scene).expect("scene");
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("open ") && lines[0].ends_with("axis.bild"));
    assert_eq!(lines[1], "cofr 0,0,0");
    assert!(lines[2].ends_with("emd.map"));
    assert_eq!(lines[3], "volume #2 style surface voxelSize 2.000000");
    assert_eq!(lines[4], "volume #2 origin 1.00,2.00,3.00");
    assert!(lines[5].ends_with("model.pdb"));
    assert_eq!(lines.len(), 6);

    let bild = fs::read_to_string(run_dir.extra("axis.bild")).expect("axis");
    assert!(bild.contains(".arrow 0 0 0 3 0 0"));

    let detached = runner.detached.borrow();
    assert_eq!(detached.len(), 1);
    assert_eq!(detached[0].program, config.viewer);
    assert_eq!(detached[0].args, vec![scene.display().to_string()]);
}

#[test]
fn scene_without_maps_uses_default_axis() {
    let dir = tempdir().expect("tempdir");
    let job = CootJob::new(AtomStructRef::new(dir.path().join("model.pdb")));
    let run_dir = RunDir::new(dir.path().join("run"), 1);
    let scene = ccp4_session::write_scene(&run_dir, &job).expect("scene");
    let text = fs::read_to_string(scene).expect("read");
    assert_eq!(text.lines().count(), 2);
    let bild = fs::read_to_string(run_dir.extra("axis.bild")).expect("axis");
    assert!(bild.contains(".arrow 0 0 0 112 0 0"));
}
