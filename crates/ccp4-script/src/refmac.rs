//! Shell drivers for map-to-MTZ preprocessing and refmac5 refinement.

use std::fs;
use std::path::{Path, PathBuf};

use ccp4_core::errors::{Ccp4Error, ErrorInfo};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::template::{render, TemplateValues};

/// Driver script names inside the run's `tmp/` directory.
pub const PREPROCESS_SCRIPT: &str = "map2mtz_refmac.sh";
pub const REFINE_SCRIPT: &str = "refine_refmac.sh";
/// Refined coordinates written into `extra/`.
pub const REFINED_PDB: &str = "refmac-refined.pdb";
pub const REFINE_LOG: &str = "refine.log";
pub const MASK_LOG: &str = "mask.log";
/// Local copy of the input map inside `extra/`.
pub const LOCAL_MAP: &str = "tmp3DMapFile.mrc";
pub const MASKED_VOLUME: &str = "mapMaskedByPdbBasedMask.mrc";
pub const PDBSET_MASKED: &str = "pdbset_mask.pdb";
pub const PDBSET_NO_MASKED: &str = "pdbset.pdb";

/// User-facing refinement parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefmacParams {
    /// Highest resolution used, in Ångström.
    pub max_resolution: f64,
    /// Lowest resolution used, in Ångström.
    pub min_resolution: f64,
    /// Cut the map around the model before computing structure factors.
    pub masked: bool,
    pub sfcalc_mapradius: f64,
    pub sfcalc_mradius: f64,
    pub cycles: u32,
    /// Map versus geometry weight; 0 lets refmac choose.
    pub weight_matrix: f64,
    /// B factor assigned before refinement.
    pub bfactor: f64,
    /// Extra keywords; `|` starts a new line.
    pub extra_params: String,
}

impl Default for RefmacParams {
    fn default() -> Self {
        Self {
            max_resolution: 5.0,
            min_resolution: 200.0,
            masked: true,
            sfcalc_mapradius: 3.0,
            sfcalc_mradius: 3.0,
            cycles: 30,
            weight_matrix: 0.0,
            bfactor: 40.0,
            extra_params: String::new(),
        }
    }
}

/// Installation and file facts the drivers need besides [`RefmacParams`].
#[derive(Debug, Clone, PartialEq)]
pub struct RefmacInputs {
    pub ccp4_home: PathBuf,
    pub refmac_bin: PathBuf,
    pub pdbset_bin: PathBuf,
    /// Structure to refine.
    pub structure: PathBuf,
    /// Local map copy, already stamped with origin and sampling.
    pub map_file: PathBuf,
    /// Directory the drivers run in and write into.
    pub output_dir: PathBuf,
    /// Cell edges read from the map header.
    pub cell: [f64; 3],
    /// Grid sampling read from the map header.
    pub grid: [usize; 3],
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// `auto` for zero, the plain number otherwise.
pub fn weight_value(weight: f64) -> String {
    if weight == 0.0 {
        "auto".to_string()
    } else {
        weight.to_string()
    }
}

/// `0` for zero, six decimals otherwise.
pub fn bfactor_value(bfactor: f64) -> String {
    if bfactor == 0.0 {
        "0".to_string()
    } else {
        format!("{bfactor:.6}")
    }
}

/// Flat placeholder mapping shared by both drivers.
pub fn parameter_map(params: &RefmacParams, inputs: &RefmacInputs) -> TemplateValues {
    let structure = absolute(&inputs.structure);
    let pdb_file = structure
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let pdb_dir = structure
        .parent()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();
    let weight_keyword = if params.weight_matrix == 0.0 {
        "auto".to_string()
    } else {
        format!("matrix {}", weight_value(params.weight_matrix))
    };

    let mut map = TemplateValues::new();
    let mut put = |key: &str, value: String| {
        map.insert(key.to_string(), value);
    };
    put("Xlength", inputs.cell[0].to_string());
    put("Ylength", inputs.cell[1].to_string());
    put("Zlength", inputs.cell[2].to_string());
    put("XDim", inputs.grid[0].to_string());
    put("YDim", inputs.grid[1].to_string());
    put("ZDim", inputs.grid[2].to_string());
    put("CCP4_HOME", inputs.ccp4_home.display().to_string());
    put("REFMAC_BIN", inputs.refmac_bin.display().to_string());
    put("PDBSET_BIN", inputs.pdbset_bin.display().to_string());
    put("PDBFILE", pdb_file);
    put("PDBDIR", pdb_dir);
    put("MAPFILE", absolute(&inputs.map_file).display().to_string());
    put("RESOMIN", params.min_resolution.to_string());
    put("RESOMAX", params.max_resolution.to_string());
    put("NCYCLE", params.cycles.to_string());
    put("WEIGHT_MATRIX", weight_value(params.weight_matrix));
    put("WEIGHT_KEYWORD", weight_keyword);
    put("OUTPUTDIR", absolute(&inputs.output_dir).display().to_string());
    put("MASKED_VOLUME", MASKED_VOLUME.to_string());
    put("PDBSET_MASKED", PDBSET_MASKED.to_string());
    put("PDBSET_NO_MASKED", PDBSET_NO_MASKED.to_string());
    put("SFCALC_MAPRADIUS", params.sfcalc_mapradius.to_string());
    put("SFCALC_MRADIUS", params.sfcalc_mradius.to_string());
    put("BFACTOR_SET", bfactor_value(params.bfactor));
    put("EXTRA_PARAMS", params.extra_params.replace('|', "\n"));
    map
}

const PREPROCESS_MASK: &str = r#"#!/bin/sh
# map to structure factors, masked around the model
set -e
cd {{OUTPUTDIR}}

# put the model in the map's unit cell
{{PDBSET_BIN}} XYZIN {{PDBDIR}}/{{PDBFILE}} XYZOUT {{PDBSET_MASKED}} << eof
CELL {{Xlength}} {{Ylength}} {{Zlength}} 90.0 90.0 90.0
SPACEGROUP P1
END
eof

# cut the map around the model and compute structure factors
{{REFMAC_BIN}} MAPIN {{MAPFILE}} XYZIN {{PDBSET_MASKED}} MAPOUT {{MASKED_VOLUME}} HKLOUT masked_fs.mtz << eof > mask.log
MODE SFCALC
SFCALC MAPRADIUS {{SFCALC_MAPRADIUS}}
SFCALC MRADIUS {{SFCALC_MRADIUS}}
SFCALC SHIFT
SFCALC BLUR
GRID {{XDim}} {{YDim}} {{ZDim}}
RESOLUTION {{RESOMAX}}
SOURCE EM MB
MAKE HYDROGEN NO
END
eof
"#;

const PREPROCESS_NOMASK: &str = r#"#!/bin/sh
# map to structure factors, whole box
set -e
cd {{OUTPUTDIR}}

# put the model in the map's unit cell
{{PDBSET_BIN}} XYZIN {{PDBDIR}}/{{PDBFILE}} XYZOUT {{PDBSET_NO_MASKED}} << eof
CELL {{Xlength}} {{Ylength}} {{Zlength}} 90.0 90.0 90.0
SPACEGROUP P1
END
eof

# structure factors of the full map
{{REFMAC_BIN}} MAPIN {{MAPFILE}} HKLOUT starting_map.mtz << eof > mask.log
MODE SFCALC
SFCALC BLUR
GRID {{XDim}} {{YDim}} {{ZDim}}
RESOLUTION {{RESOMAX}}
SOURCE EM MB
END
eof
"#;

const REFINE_MASK: &str = r#"#!/bin/sh
# real-space refinement against the masked map
set -e
cd {{OUTPUTDIR}}

{{REFMAC_BIN}} HKLIN masked_fs.mtz XYZIN {{PDBSET_MASKED}} XYZOUT {{OUTPUTDIR}}/refmac-refined.pdb << eof > refine.log
LABIN FP=Fout0 PHIB=Pout0
MAKE HYDROGEN NO
SOLVENT NO
SOURCE EM MB
NCYCLE {{NCYCLE}}
WEIGHT {{WEIGHT_KEYWORD}}
BFACTOR SET {{BFACTOR_SET}}
RESOLUTION {{RESOMIN}} {{RESOMAX}}
REFI BREF ISOT
RIDGE DISTANCE SIGMA 0.02
PHOUT
PNAME refmac
DNAME refined
{{EXTRA_PARAMS}}
END
eof
"#;

const REFINE_NOMASK: &str = r#"#!/bin/sh
# real-space refinement against the full map
set -e
cd {{OUTPUTDIR}}

{{REFMAC_BIN}} HKLIN starting_map.mtz XYZIN {{PDBSET_NO_MASKED}} XYZOUT {{OUTPUTDIR}}/refmac-refined.pdb << eof > refine.log
LABIN FP=Fout0 PHIB=Pout0
MAKE HYDROGEN NO
SOLVENT NO
SOURCE EM MB
NCYCLE {{NCYCLE}}
WEIGHT {{WEIGHT_KEYWORD}}
BFACTOR SET {{BFACTOR_SET}}
RESOLUTION {{RESOMIN}} {{RESOMAX}}
REFI BREF ISOT
RIDGE DISTANCE SIGMA 0.02
PHOUT
PNAME refmac
DNAME refined
{{EXTRA_PARAMS}}
END
eof
"#;

/// Map-to-MTZ driver; the masked flag picks the body.
pub fn preprocess_script(masked: bool, values: &TemplateValues) -> Result<String, Ccp4Error> {
    render(if masked { PREPROCESS_MASK } else { PREPROCESS_NOMASK }, values)
}

/// Refinement driver; the masked flag picks the body.
pub fn refine_script(masked: bool, values: &TemplateValues) -> Result<String, Ccp4Error> {
    render(if masked { REFINE_MASK } else { REFINE_NOMASK }, values)
}

/// Writes a driver script readable, writable and executable by the owner only.
pub fn write_executable(path: &Path, contents: &str) -> Result<(), Ccp4Error> {
    fs::write(path, contents).map_err(|err| Ccp4Error::io("ccp4_script.write", path, err))?;
    set_owner_only(path)?;
    debug!(path = %path.display(), "wrote driver script");
    Ok(())
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> Result<(), Ccp4Error> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700)).map_err(|err| {
        Ccp4Error::Template(
            ErrorInfo::new("ccp4_script.chmod", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> Result<(), Ccp4Error> {
    Ok(())
}
