use std::fs;
use std::path::{Path, PathBuf};

use ccp4_core::errors::Ccp4Error;
use ccp4_core::RunDir;
use ccp4_env::{Ccp4Config, Invocation, ProgramRunner};
use ccp4_ledger::Ledger;
use ccp4_script::viewer::{AXIS_FILE, SCENE_FILE};
use ccp4_script::{axis_bild, axis_size, scene_script, SceneVolume};
use tracing::info;

use crate::coot::{CootJob, LEDGER_FILE};

fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Writes the axis marker and scene for a coot run; returns the scene path.
pub fn write_scene(run_dir: &RunDir, job: &CootJob) -> Result<PathBuf, Ccp4Error> {
    run_dir.ensure()?;
    let volumes = job.input_volumes();

    let sizes: Vec<(usize, f64)> = volumes
        .iter()
        .map(|volume| (volume.dim, volume.sampling_rate))
        .collect();
    let (dim, sampling) = axis_size(&sizes);
    let axis = absolute(&run_dir.extra_dir()).join(AXIS_FILE);
    fs::write(&axis, axis_bild(dim, sampling))
        .map_err(|err| Ccp4Error::io("ccp4_session.write_axis", &axis, err))?;

    let scene_volumes: Vec<SceneVolume> = volumes
        .iter()
        .map(|volume| SceneVolume {
            file_name: absolute(&volume.file_name),
            sampling_rate: volume.sampling_rate,
            origin: volume.origin,
        })
        .collect();

    let ledger_path = run_dir.extra(LEDGER_FILE);
    let models = if ledger_path.exists() {
        let ledger = Ledger::open(&ledger_path, &job.table)?;
        if ledger.table_exists()? {
            ledger
                .imported_records()?
                .into_iter()
                .map(|record| absolute(Path::new(&record.file_name)).display().to_string())
                .collect()
        } else {
            Vec::new()
        }
    } else {
        Vec::new()
    };

    let scene = run_dir.extra(SCENE_FILE);
    fs::write(&scene, scene_script(&axis, &scene_volumes, &models))
        .map_err(|err| Ccp4Error::io("ccp4_session.write_scene", &scene, err))?;
    Ok(scene)
}

/// Writes the scene and starts the viewer on it without waiting.
pub fn show_coot_session<R: ProgramRunner>(
    run_dir: &RunDir,
    job: &CootJob,
    config: &Ccp4Config,
    runner: &R,
) -> Result<PathBuf, Ccp4Error> {
    let scene = write_scene(run_dir, job)?;
    let invocation = Invocation::new(&config.viewer).arg(scene.display().to_string());
    info!(scene = %scene.display(), "opening viewer");
    runner.spawn_detached(&invocation, None)?;
    Ok(scene)
}
