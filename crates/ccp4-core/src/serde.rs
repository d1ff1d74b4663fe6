//! Canonical JSON helpers used for reports and session state, plus YAML for job files.

use std::collections::BTreeMap;
use std::iter::FromIterator;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Ccp4Error, ErrorInfo};

fn serde_error(code: &str, err: impl ToString) -> Ccp4Error {
    Ccp4Error::Serde(ErrorInfo::new(code, err.to_string()))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered = map
                .into_iter()
                .map(|(key, value)| (key, canonicalize(value)))
                .collect::<BTreeMap<_, _>>();
            Value::Object(Map::from_iter(ordered))
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serializes a value into canonical JSON bytes with deterministic key ordering.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, Ccp4Error> {
    let value = serde_json::to_value(value).map_err(|err| serde_error("ccp4_core.json_serialize", err))?;
    let canonical = canonicalize(value);
    let mut bytes = Vec::new();
    serde_json::to_writer_pretty(&mut bytes, &canonical)
        .map_err(|err| serde_error("ccp4_core.json_write", err))?;
    Ok(bytes)
}

/// Deserializes a value from JSON bytes.
pub fn from_json_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, Ccp4Error> {
    serde_json::from_slice(data).map_err(|err| serde_error("ccp4_core.json_deserialize", err))
}

/// Serializes a value into YAML.
pub fn to_yaml_string<T: Serialize>(value: &T) -> Result<String, Ccp4Error> {
    serde_yaml::to_string(value).map_err(|err| serde_error("ccp4_core.yaml_serialize", err))
}

/// Deserializes a YAML payload into the requested type.
pub fn from_yaml_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, Ccp4Error> {
    serde_yaml::from_slice(data).map_err(|err| serde_error("ccp4_core.yaml_deserialize", err))
}
