//! The fixed 1024-byte CCP4/MRC header.
//!
//! Words are 4 bytes. The byte order of a file is taken from the machine
//! stamp at word 53; files without a recognisable stamp are read as
//! little-endian, which is what every writer in this workspace produces.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ccp4_core::errors::{Ccp4Error, ErrorInfo};
use serde::{Deserialize, Serialize};

/// Size of the main header in bytes.
pub const HEADER_LEN: usize = 1024;
const LABEL_LEN: usize = 80;
const LABEL_COUNT: usize = 10;
const MAP_STAMP: &[u8; 4] = b"MAP ";

/// Storage mode of the voxel block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Int8,
    Int16,
    Float32,
    UInt16,
}

impl Mode {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Mode::Int8),
            1 => Some(Mode::Int16),
            2 => Some(Mode::Float32),
            6 => Some(Mode::UInt16),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Mode::Int8 => 0,
            Mode::Int16 => 1,
            Mode::Float32 => 2,
            Mode::UInt16 => 6,
        }
    }

    /// Bytes per voxel.
    pub fn width(self) -> usize {
        match self {
            Mode::Int8 => 1,
            Mode::Int16 | Mode::UInt16 => 2,
            Mode::Float32 => 4,
        }
    }
}

/// Byte order of a map file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    fn from_stamp(stamp: [u8; 4]) -> Self {
        if stamp[0] == 0x11 && stamp[1] == 0x11 {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    fn stamp(self) -> [u8; 4] {
        match self {
            Endian::Little => [0x44, 0x41, 0x00, 0x00],
            Endian::Big => [0x11, 0x11, 0x00, 0x00],
        }
    }
}

/// Decoded header fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapHeader {
    /// Columns, rows, sections.
    pub dims: [usize; 3],
    pub mode: Mode,
    /// Index of the first column, row and section.
    pub start: [i32; 3],
    /// Grid sampling along the unit cell axes.
    pub grid: [usize; 3],
    /// Unit cell edges in Ångström.
    pub cell: [f32; 3],
    /// Unit cell angles in degrees.
    pub angles: [f32; 3],
    /// Axis order (1 = X, 2 = Y, 3 = Z) of columns, rows, sections.
    pub axis_order: [i32; 3],
    pub dmin: f32,
    pub dmax: f32,
    pub dmean: f32,
    pub rms: f32,
    pub space_group: i32,
    /// Length of the extended header that follows the main header.
    pub ext_len: usize,
    /// Physical origin in Ångström (MRC-2000 words 50-52).
    pub origin: [f32; 3],
    pub endian: Endian,
    pub labels: Vec<String>,
}

impl MapHeader {
    /// Float32 header for a `dims` box with cubic voxels of `sampling` Å.
    pub fn new(dims: [usize; 3], sampling: f64) -> Self {
        let cell = [
            (dims[0] as f64 * sampling) as f32,
            (dims[1] as f64 * sampling) as f32,
            (dims[2] as f64 * sampling) as f32,
        ];
        Self {
            dims,
            mode: Mode::Float32,
            start: [0; 3],
            grid: dims,
            cell,
            angles: [90.0; 3],
            axis_order: [1, 2, 3],
            dmin: 0.0,
            dmax: 0.0,
            dmean: 0.0,
            rms: 0.0,
            space_group: 1,
            ext_len: 0,
            origin: [0.0; 3],
            endian: Endian::Little,
            labels: Vec::new(),
        }
    }

    /// Number of voxels in the block; `None` if the product overflows.
    pub fn voxel_count(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |count, &dim| count.checked_mul(dim))
    }

    /// Bytes from the start of the file to the end of the voxel block.
    pub fn file_len(&self) -> Result<usize, Ccp4Error> {
        self.voxel_count()
            .and_then(|count| count.checked_mul(self.mode.width()))
            .and_then(|block| block.checked_add(self.data_offset()))
            .ok_or_else(|| {
                map_error(
                    "ccp4_map.too_large",
                    format!("a {:?} voxel box does not fit in memory", self.dims),
                )
            })
    }

    /// Offset of the voxel block from the start of the file.
    pub fn data_offset(&self) -> usize {
        HEADER_LEN + self.ext_len
    }

    /// Cell edges (`Xlength`, `Ylength`, `Zlength`).
    pub fn cell_dimensions(&self) -> [f64; 3] {
        [self.cell[0] as f64, self.cell[1] as f64, self.cell[2] as f64]
    }

    /// Grid sampling (`XDim`, `YDim`, `ZDim`).
    pub fn grid_sampling(&self) -> [usize; 3] {
        self.grid
    }

    /// Voxel size along X derived from cell and grid.
    pub fn sampling_rate(&self) -> f64 {
        if self.grid[0] == 0 {
            return 0.0;
        }
        self.cell[0] as f64 / self.grid[0] as f64
    }

    /// Rewrites cell, grid, start and origin for cubic voxels of `sampling` Å
    /// whose voxel (0, 0, 0) sits at `origin`.
    pub fn stamp(&mut self, sampling: f64, origin: [f64; 3]) {
        self.grid = self.dims;
        for axis in 0..3 {
            self.cell[axis] = (self.dims[axis] as f64 * sampling) as f32;
            self.origin[axis] = origin[axis] as f32;
            self.start[axis] = if sampling > 0.0 {
                (origin[axis] / sampling).round() as i32
            } else {
                0
            };
        }
        self.angles = [90.0; 3];
    }

    /// Decodes the first [`HEADER_LEN`] bytes of a map file.
    pub fn parse(bytes: &[u8]) -> Result<Self, Ccp4Error> {
        if bytes.len() < HEADER_LEN {
            return Err(map_error(
                "ccp4_map.short_header",
                format!("header needs {HEADER_LEN} bytes, got {}", bytes.len()),
            ));
        }
        let endian = Endian::from_stamp(word_bytes(bytes, 53));
        let int = |index: usize| read_i32(bytes, index, endian);
        let float = |index: usize| read_f32(bytes, index, endian);

        let mode_code = int(3);
        let mode = Mode::from_code(mode_code).ok_or_else(|| {
            Ccp4Error::Map(
                ErrorInfo::new("ccp4_map.mode", format!("unsupported map mode {mode_code}"))
                    .with_hint("only modes 0, 1, 2 and 6 are handled"),
            )
        })?;
        let dims = [dim(int(0))?, dim(int(1))?, dim(int(2))?];
        let grid = [dim(int(7))?, dim(int(8))?, dim(int(9))?];
        let ext_len = dim(int(23))?;

        let label_count = (int(55).max(0) as usize).min(LABEL_COUNT);
        let labels = (0..label_count)
            .map(|n| {
                let from = 56 * 4 + n * LABEL_LEN;
                String::from_utf8_lossy(&bytes[from..from + LABEL_LEN])
                    .trim_end_matches(['\0', ' '])
                    .to_string()
            })
            .collect();

        Ok(Self {
            dims,
            mode,
            start: [int(4), int(5), int(6)],
            grid,
            cell: [float(10), float(11), float(12)],
            angles: [float(13), float(14), float(15)],
            axis_order: [int(16), int(17), int(18)],
            dmin: float(19),
            dmax: float(20),
            dmean: float(21),
            rms: float(54),
            space_group: int(22),
            ext_len,
            origin: [float(49), float(50), float(51)],
            endian,
            labels,
        })
    }

    /// Reads only the header of the map file at `path`.
    pub fn read(path: &Path) -> Result<Self, Ccp4Error> {
        let mut bytes = [0u8; HEADER_LEN];
        File::open(path)
            .and_then(|mut file| file.read_exact(&mut bytes))
            .map_err(|err| {
                Ccp4Error::Map(
                    ErrorInfo::new("ccp4_map.read_header", err.to_string())
                        .with_context("path", path.display().to_string()),
                )
            })?;
        Self::parse(&bytes)
    }

    /// Encodes the header; the extended header length is always written as 0.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        let endian = self.endian;
        let mut int = |index: usize, value: i32| put_word(&mut out, index, i32_bytes(value, endian));
        int(0, self.dims[0] as i32);
        int(1, self.dims[1] as i32);
        int(2, self.dims[2] as i32);
        int(3, self.mode.code());
        int(4, self.start[0]);
        int(5, self.start[1]);
        int(6, self.start[2]);
        int(7, self.grid[0] as i32);
        int(8, self.grid[1] as i32);
        int(9, self.grid[2] as i32);
        int(16, self.axis_order[0]);
        int(17, self.axis_order[1]);
        int(18, self.axis_order[2]);
        int(22, self.space_group);
        int(23, 0);
        let labels: Vec<&String> = self.labels.iter().take(LABEL_COUNT).collect();
        int(55, labels.len() as i32);

        let floats = [
            (10, self.cell[0]),
            (11, self.cell[1]),
            (12, self.cell[2]),
            (13, self.angles[0]),
            (14, self.angles[1]),
            (15, self.angles[2]),
            (19, self.dmin),
            (20, self.dmax),
            (21, self.dmean),
            (49, self.origin[0]),
            (50, self.origin[1]),
            (51, self.origin[2]),
            (54, self.rms),
        ];
        for (index, value) in floats {
            put_word(&mut out, index, f32_bytes(value, endian));
        }
        put_word(&mut out, 52, *MAP_STAMP);
        put_word(&mut out, 53, endian.stamp());

        for (n, label) in labels.into_iter().enumerate() {
            let from = 56 * 4 + n * LABEL_LEN;
            let text = label.as_bytes();
            let len = text.len().min(LABEL_LEN);
            out[from..from + len].copy_from_slice(&text[..len]);
        }
        out
    }
}

pub(crate) fn map_error(code: &str, message: impl Into<String>) -> Ccp4Error {
    Ccp4Error::Map(ErrorInfo::new(code, message))
}

fn dim(value: i32) -> Result<usize, Ccp4Error> {
    usize::try_from(value)
        .map_err(|_| map_error("ccp4_map.negative_size", format!("negative header size {value}")))
}

fn word_bytes(bytes: &[u8], index: usize) -> [u8; 4] {
    let from = index * 4;
    [bytes[from], bytes[from + 1], bytes[from + 2], bytes[from + 3]]
}

fn read_i32(bytes: &[u8], index: usize, endian: Endian) -> i32 {
    let word = word_bytes(bytes, index);
    match endian {
        Endian::Little => i32::from_le_bytes(word),
        Endian::Big => i32::from_be_bytes(word),
    }
}

fn read_f32(bytes: &[u8], index: usize, endian: Endian) -> f32 {
    let word = word_bytes(bytes, index);
    match endian {
        Endian::Little => f32::from_le_bytes(word),
        Endian::Big => f32::from_be_bytes(word),
    }
}

fn i32_bytes(value: i32, endian: Endian) -> [u8; 4] {
    match endian {
        Endian::Little => value.to_le_bytes(),
        Endian::Big => value.to_be_bytes(),
    }
}

fn f32_bytes(value: f32, endian: Endian) -> [u8; 4] {
    match endian {
        Endian::Little => value.to_le_bytes(),
        Endian::Big => value.to_be_bytes(),
    }
}

fn put_word(out: &mut [u8; HEADER_LEN], index: usize, word: [u8; 4]) {
    out[index * 4..index * 4 + 4].copy_from_slice(&word);
}
