use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of artifact tracked by the output ledger.
///
/// The integer values are part of the ledger file format and of the
/// extension script contract, so they must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// A 3D density map.
    VolumeMap,
    /// An atomic structure (PDB or mmCIF).
    AtomicStructure,
}

impl ArtifactKind {
    /// Integer stored in the ledger `kind` column.
    pub const fn code(self) -> i64 {
        match self {
            ArtifactKind::VolumeMap => 0,
            ArtifactKind::AtomicStructure => 1,
        }
    }

    /// Maps a ledger `kind` column back to the enum.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ArtifactKind::VolumeMap),
            1 => Some(ArtifactKind::AtomicStructure),
            _ => None,
        }
    }
}

/// A density map known to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRef {
    /// Location of the map container on disk.
    pub file_name: PathBuf,
    /// Voxel size in Ångström.
    pub sampling_rate: f64,
    /// Physical coordinate (Ångström) of voxel (0, 0, 0).
    #[serde(default)]
    pub origin: [f64; 3],
    /// Box edge in voxels, used to size viewer markers.
    #[serde(default)]
    pub dim: usize,
}

/// An atomic structure known to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomStructRef {
    /// Location of the coordinate file.
    pub file_name: PathBuf,
    /// Map the structure was built into, if the host recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<VolumeRef>,
}

impl AtomStructRef {
    /// Creates a reference without an associated map.
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            volume: None,
        }
    }
}

/// Object handed back to the host for registration as a task output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostOutput {
    /// A new atomic structure registered under `label`.
    AtomStruct {
        /// Output name used by the host.
        label: String,
        /// Coordinate file produced by the external tool.
        file_name: PathBuf,
        /// Inputs the structure derives from.
        sources: Vec<PathBuf>,
    },
    /// A volume registered under `key` (`output3DMap_%04d`).
    Volume {
        /// Output name used by the host.
        key: String,
        /// Normalized map container.
        file_name: PathBuf,
        /// Voxel size copied from the input volume.
        sampling_rate: f64,
        /// Origin copied from the input volume.
        origin: [f64; 3],
        /// Input volume the output derives from.
        source: PathBuf,
    },
}

impl HostOutput {
    /// Name under which the host registers the output.
    pub fn name(&self) -> &str {
        match self {
            HostOutput::AtomStruct { label, .. } => label,
            HostOutput::Volume { key, .. } => key,
        }
    }

    /// Location of the produced file.
    pub fn file_name(&self) -> &Path {
        match self {
            HostOutput::AtomStruct { file_name, .. } | HostOutput::Volume { file_name, .. } => {
                file_name
            }
        }
    }
}

/// Base name of `path` without its extension.
pub fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
