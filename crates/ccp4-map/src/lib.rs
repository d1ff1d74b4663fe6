//! Reading and writing CCP4/MRC density map containers.

pub mod header;
pub mod volume;

pub use header::{Endian, MapHeader, Mode, HEADER_LEN};
pub use volume::{convert_map, DensityMap, MapStats};
