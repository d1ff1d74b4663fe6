use std::fs;
use std::path::Path;

use ccp4_core::errors::{Ccp4Error, ErrorInfo};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::header::{map_error, Endian, MapHeader, Mode};

/// Summary statistics of a voxel block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// A density map held in memory as float32 voxels, X fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMap {
    pub header: MapHeader,
    pub data: Vec<f32>,
}

fn io_error(code: &str, path: &Path, err: std::io::Error) -> Ccp4Error {
    Ccp4Error::Map(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

impl DensityMap {
    /// Zero-filled float32 map of `dims` voxels of `sampling` Å.
    pub fn zeros(dims: [usize; 3], sampling: f64) -> Result<Self, Ccp4Error> {
        let header = MapHeader::new(dims, sampling);
        header.file_len()?;
        let data = vec![0.0; header.voxel_count().unwrap_or_default()];
        Ok(Self { header, data })
    }

    /// Builds a map from voxels; `data.len()` must match `dims`.
    pub fn from_data(dims: [usize; 3], sampling: f64, data: Vec<f32>) -> Result<Self, Ccp4Error> {
        let header = MapHeader::new(dims, sampling);
        if header.voxel_count() != Some(data.len()) {
            return Err(map_error(
                "ccp4_map.size_mismatch",
                format!("{} voxels for a {:?} box", data.len(), dims),
            ));
        }
        Ok(Self { header, data })
    }

    /// Reads a CCP4/MRC container, converting any supported mode to float32.
    pub fn read(path: &Path) -> Result<Self, Ccp4Error> {
        let bytes = fs::read(path).map_err(|err| io_error("ccp4_map.read", path, err))?;
        Self::decode(&bytes).map_err(|err| match err {
            Ccp4Error::Map(info) => {
                Ccp4Error::Map(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Decodes a complete map file held in memory.
    pub fn decode(bytes: &[u8]) -> Result<Self, Ccp4Error> {
        let header = MapHeader::parse(bytes)?;
        let width = header.mode.width();
        let offset = header.data_offset();
        let needed = header.file_len()?;
        if bytes.len() < needed {
            return Err(map_error(
                "ccp4_map.truncated",
                format!("voxel block needs {needed} bytes, file has {}", bytes.len()),
            ));
        }
        let block = &bytes[offset..needed];
        let endian = header.endian;
        let data = block
            .chunks_exact(width)
            .map(|chunk| decode_voxel(chunk, header.mode, endian))
            .collect();
        Ok(Self { header, data })
    }

    /// Writes the map as a little-endian float32 container with fresh statistics.
    pub fn write(&self, path: &Path) -> Result<(), Ccp4Error> {
        let bytes = self.encode();
        fs::write(path, bytes).map_err(|err| io_error("ccp4_map.write", path, err))?;
        debug!(path = %path.display(), dims = ?self.header.dims, "wrote map");
        Ok(())
    }

    /// Encodes the map; see [`DensityMap::write`].
    pub fn encode(&self) -> Vec<u8> {
        let stats = self.stats();
        let mut header = self.header.clone();
        header.mode = Mode::Float32;
        header.endian = Endian::Little;
        header.ext_len = 0;
        header.dmin = stats.min as f32;
        header.dmax = stats.max as f32;
        header.dmean = stats.mean as f32;
        header.rms = stats.std as f32;
        if header.labels.is_empty() {
            header.labels.push("ccp4-bridge".to_string());
        }

        let mut out = Vec::with_capacity(header.data_offset() + self.data.len() * 4);
        out.extend_from_slice(&header.to_bytes());
        for value in &self.data {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Mean, standard deviation, minimum and maximum over all voxels.
    pub fn stats(&self) -> MapStats {
        if self.data.is_empty() {
            return MapStats {
                mean: 0.0,
                std: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }
        let n = self.data.len() as f64;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &value in &self.data {
            let value = value as f64;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        let mean = sum / n;
        let variance = self
            .data
            .iter()
            .map(|&value| {
                let d = value as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        MapStats {
            mean,
            std: variance.sqrt(),
            min,
            max,
        }
    }

    /// Multiplies every voxel by `1/max`. A map whose maximum is zero is left
    /// untouched and `false` is returned.
    pub fn normalize(&mut self) -> bool {
        let max = self.stats().max;
        if max == 0.0 {
            warn!("map maximum is zero, skipping normalization");
            return false;
        }
        let scale = 1.0 / max;
        for value in &mut self.data {
            *value = (*value as f64 * scale) as f32;
        }
        true
    }

    /// See [`MapHeader::stamp`].
    pub fn stamp(&mut self, sampling: f64, origin: [f64; 3]) {
        self.header.stamp(sampling, origin);
    }
}

fn decode_voxel(chunk: &[u8], mode: Mode, endian: Endian) -> f32 {
    match (mode, endian) {
        (Mode::Int8, _) => chunk[0] as i8 as f32,
        (Mode::Int16, Endian::Little) => i16::from_le_bytes([chunk[0], chunk[1]]) as f32,
        (Mode::Int16, Endian::Big) => i16::from_be_bytes([chunk[0], chunk[1]]) as f32,
        (Mode::UInt16, Endian::Little) => u16::from_le_bytes([chunk[0], chunk[1]]) as f32,
        (Mode::UInt16, Endian::Big) => u16::from_be_bytes([chunk[0], chunk[1]]) as f32,
        (Mode::Float32, Endian::Little) => {
            f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
        }
        (Mode::Float32, Endian::Big) => f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
    }
}

/// Reads `input`, optionally rescales it by its maximum, stamps sampling and
/// origin, and writes a float32 container to `output`.
///
/// Returns the statistics of the input before rescaling.
pub fn convert_map(
    input: &Path,
    output: &Path,
    sampling: f64,
    origin: [f64; 3],
    normalize: bool,
) -> Result<MapStats, Ccp4Error> {
    let mut map = DensityMap::read(input)?;
    let stats = map.stats();
    debug!(
        input = %input.display(),
        mean = stats.mean,
        std = stats.std,
        min = stats.min,
        max = stats.max,
        "map statistics"
    );
    if normalize {
        map.normalize();
    }
    map.stamp(sampling, origin);
    map.write(output)?;
    Ok(stats)
}
