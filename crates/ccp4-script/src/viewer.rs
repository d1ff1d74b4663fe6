//! ChimeraX scene: a coordinate axis marker plus the session's maps and models.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Axis length in voxels used when no input map is known.
pub const DEFAULT_AXIS_DIM: usize = 150;
pub const DEFAULT_AXIS_SAMPLING: f64 = 1.0;

pub const AXIS_FILE: &str = "axis.bild";
pub const SCENE_FILE: &str = "chimera.cxc";

/// A map as shown in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneVolume {
    pub file_name: PathBuf,
    pub sampling_rate: f64,
    pub origin: [f64; 3],
}

/// BILD file with red, yellow and blue arrows along X, Y and Z.
///
/// Arrow lengths are truncated to whole Ångström.
pub fn axis_bild(dim: usize, sampling: f64) -> String {
    let length = sampling * dim as f64 * 3.0 / 4.0;
    let r1 = 0.1 * dim as f64 / 50.0;
    let r2 = 4.0 * 0.1;
    let rho = 0.75;
    let mut out = String::new();
    let axes = [
        ("1 0 0", [1.0, 0.0, 0.0]),
        ("1 1 0", [0.0, 1.0, 0.0]),
        ("0 0 1", [0.0, 0.0, 1.0]),
    ];
    for (colour, axis) in axes {
        let _ = writeln!(out, ".color {colour}");
        let _ = writeln!(
            out,
            ".arrow 0 0 0 {} {} {} {r1:.6} {r2:.6} {rho:.6}",
            (axis[0] * length) as i64,
            (axis[1] * length) as i64,
            (axis[2] * length) as i64
        );
    }
    out
}

/// Axis size for a set of maps: the largest box edge and the largest sampling.
pub fn axis_size(volumes: &[(usize, f64)]) -> (usize, f64) {
    if volumes.is_empty() {
        return (DEFAULT_AXIS_DIM, DEFAULT_AXIS_SAMPLING);
    }
    let dim = volumes.iter().map(|(dim, _)| *dim).max().unwrap_or(DEFAULT_AXIS_DIM);
    let sampling = volumes
        .iter()
        .map(|(_, sampling)| *sampling)
        .fold(f64::MIN, f64::max);
    (dim, sampling)
}

/// Command script opening the axis, every map (models from #2) and every
/// model file that is not a map.
pub fn scene_script(axis: &Path, volumes: &[SceneVolume], models: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "open {}", axis.display());
    out.push_str("cofr 0,0,0\n");
    for (index, volume) in volumes.iter().enumerate() {
        let model = index + 2;
        let [x, y, z] = volume.origin;
        let _ = writeln!(out, "open {}", volume.file_name.display());
        let _ = writeln!(
            out,
            "volume #{model} style surface voxelSize {:.6}",
            volume.sampling_rate
        );
        let _ = writeln!(out, "volume #{model} origin {x:.2},{y:.2},{z:.2}");
    }
    for model in models.iter().filter(|name| !name.ends_with(".mrc")) {
        let _ = writeln!(out, "open {model}");
    }
    out
}
