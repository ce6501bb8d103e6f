//! Reduced dataset extraction.
//!
//! The runtime only needs the statistics tables, so the raw dataset is cut
//! down to those four keys before shipping. Values pass through untouched.

use serde_json::{Map, Value};

use crate::dataset::RawDataset;

/// Top-level keys kept in the reduced dataset, in output order.
pub const REDUCED_TABLES: [&str; 4] = ["PerkStats", "TraitStats", "MWStats", "ReviewSummary"];

/// Project a raw dataset onto [`REDUCED_TABLES`]
///
/// Missing or null tables become empty objects. Applying this to its own
/// output returns the same document.
pub fn reduce_dataset(dataset: &RawDataset) -> Value {
    Value::Object(reduce_map(dataset.root()))
}

/// [`reduce_dataset`] over a plain JSON object
pub fn reduce_map(root: &Map<String, Value>) -> Map<String, Value> {
    REDUCED_TABLES
        .iter()
        .map(|key| {
            let table = match root.get(*key) {
                None | Some(Value::Null) => Value::Object(Map::new()),
                Some(value) => value.clone(),
            };
            (key.to_string(), table)
        })
        .collect()
}
