#![deny(missing_docs)]
#![doc = "Shared error surface and data types for the CCP4 bridge crates."]

pub mod errors;
#[allow(missing_docs)]
pub mod rundir;
pub mod serde;
mod types;

pub use errors::{Ccp4Error, ErrorInfo};
pub use rundir::RunDir;
pub use crate::serde::{from_json_slice, from_yaml_slice, to_canonical_json_bytes, to_yaml_string};
pub use types::{file_label, ArtifactKind, AtomStructRef, HostOutput, VolumeRef};
