//! Raw roll appraiser dataset.
//!
//! The dataset is a third-party JSON document. It is kept as an untyped
//! object so the reduction step can pass statistics tables through
//! unchanged, while the weapon roll columns are read through the
//! typed [`PerkDescriptor`] view which skips malformed entries.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ItemHash;

/// Top-level key holding the weapon collection.
pub const WEAPONS_KEY: &str = "Weapons";

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dataset root must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// The raw dataset document as read from disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDataset {
    root: Map<String, Value>,
}

impl RawDataset {
    /// Wrap an already-parsed JSON object
    pub fn from_map(root: Map<String, Value>) -> Self {
        RawDataset { root }
    }

    /// Parse a dataset from JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DatasetError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Accept a parsed JSON value, rejecting anything but an object
    pub fn from_value(value: Value) -> Result<Self, DatasetError> {
        match value {
            Value::Object(root) => Ok(RawDataset { root }),
            other => Err(DatasetError::NotAnObject(json_kind(&other))),
        }
    }

    /// Read and parse a dataset file
    ///
    /// A missing file is reported as [`DatasetError::NotFound`] so callers
    /// can treat it as the fatal build error it is.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DatasetError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        Self::from_slice(&bytes)
    }

    /// The whole document
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// A top-level table by key
    pub fn table(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// The weapon collection, if the document has one
    pub fn weapons(&self) -> Option<&Map<String, Value>> {
        self.root.get(WEAPONS_KEY).and_then(Value::as_object)
    }
}

/// Socket columns of a weapon's random rolls
///
/// Returns `None` when the weapon has no `RandomRolls` array. Columns that
/// are not arrays are skipped.
pub fn socket_columns(weapon: &Value) -> Option<impl Iterator<Item = &Vec<Value>>> {
    let rolls = weapon.get("RandomRolls")?.as_array()?;
    Some(rolls.iter().filter_map(Value::as_array))
}

/// A perk entry inside a socket column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerkDescriptor<'a> {
    pub item_hash: ItemHash,
    pub name: &'a str,
}

impl<'a> PerkDescriptor<'a> {
    /// Read a descriptor, returning `None` if the hash or name is missing
    ///
    /// A zero hash, an empty name, or a hash outside the 32-bit range count
    /// as missing.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        let item_hash = value.get("ItemHash")?.as_u64()?;
        let item_hash = ItemHash::try_from(item_hash).ok().filter(|h| *h != 0)?;
        let name = value.get("Name")?.as_str().filter(|n| !n.is_empty())?;
        Some(PerkDescriptor { item_hash, name })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_rejects_non_object() {
        let err = RawDataset::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, DatasetError::NotAnObject("an array")));
    }

    #[test]
    fn test_open_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("rollAppraiserData.json");

        let err = RawDataset::open(&path).unwrap_err();
        assert!(matches!(err, DatasetError::NotFound(p) if p == path));
    }

    #[test]
    fn test_open_reads_weapons() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("data.json");
        fs::write(&path, r#"{"Weapons": {"1": {"RandomRolls": []}}}"#).unwrap();

        let dataset = RawDataset::open(&path).unwrap();
        assert_eq!(dataset.weapons().map(|w| w.len()), Some(1));
    }

    #[test]
    fn test_weapons_absent() {
        let dataset = RawDataset::from_value(json!({"PerkStats": {}})).unwrap();
        assert!(dataset.weapons().is_none());
    }

    #[test]
    fn test_perk_descriptor_skips_malformed() {
        let good = json!({"ItemHash": 100, "Name": "Fast", "Extra": true});
        assert_eq!(
            PerkDescriptor::from_value(&good),
            Some(PerkDescriptor {
                item_hash: 100,
                name: "Fast"
            })
        );

        for bad in [
            json!({"Name": "Fast"}),
            json!({"ItemHash": 100}),
            json!({"ItemHash": 0, "Name": "Fast"}),
            json!({"ItemHash": 100, "Name": ""}),
            json!({"ItemHash": "100", "Name": "Fast"}),
            json!({"ItemHash": 5_000_000_000u64, "Name": "Fast"}),
        ] {
            assert_eq!(PerkDescriptor::from_value(&bad), None, "{}", bad);
        }
    }

    #[test]
    fn test_socket_columns_skips_non_arrays() {
        let weapon = json!({"RandomRolls": [[{"ItemHash": 1, "Name": "A"}], "junk", []]});
        let columns: Vec<_> = socket_columns(&weapon).unwrap().collect();
        assert_eq!(columns.len(), 2);

        assert!(socket_columns(&json!({"RandomRolls": {}})).is_none());
        assert!(socket_columns(&json!({})).is_none());
    }
}
