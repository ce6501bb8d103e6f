//! Standard -> enhanced perk hash mapping.
//!
//! A perk that can be enhanced appears in the weapon roll columns under two
//! item hashes sharing one display name. Collecting every hash per name
//! across the whole dataset and keeping the names with exactly two hashes
//! yields the mapping.
//!
//! Which of the two hashes is "standard" is decided by a [`MappingPolicy`].
//! The two policies disagree on direction, so a consumer must never assume
//! the sign of the mapping without knowing which policy produced it.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::dataset::{socket_columns, PerkDescriptor, RawDataset};
use crate::ItemHash;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown mapping policy: {0}")]
    UnknownPolicy(String),
}

/// How the two hashes observed for one perk name are assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappingPolicy {
    /// Sort numerically: the smaller hash is standard, the larger enhanced
    #[default]
    AscendingHash,
    /// The first hash seen is enhanced, the second standard
    FirstSeenEnhanced,
}

impl MappingPolicy {
    /// Split a name's two hashes into `(standard, enhanced)`
    pub fn assign(&self, first_seen: ItemHash, second_seen: ItemHash) -> (ItemHash, ItemHash) {
        match self {
            Self::AscendingHash => (first_seen.min(second_seen), first_seen.max(second_seen)),
            Self::FirstSeenEnhanced => (second_seen, first_seen),
        }
    }
}

impl std::fmt::Display for MappingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AscendingHash => write!(f, "ascending-hash"),
            Self::FirstSeenEnhanced => write!(f, "first-seen-enhanced"),
        }
    }
}

impl std::str::FromStr for MappingPolicy {
    type Err = MappingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascending-hash" | "ascending" => Ok(Self::AscendingHash),
            "first-seen-enhanced" | "first-seen" => Ok(Self::FirstSeenEnhanced),
            _ => Err(MappingError::UnknownPolicy(s.to_string())),
        }
    }
}

/// Perk display name -> distinct hashes observed for it, in first-seen order.
#[derive(Debug, Default)]
pub struct PerkNameIndex {
    names: Vec<(String, Vec<ItemHash>)>,
    positions: HashMap<String, usize>,
    weapons_processed: usize,
}

impl PerkNameIndex {
    /// Walk every weapon's random roll columns
    ///
    /// Returns `None` if the dataset has no `Weapons` collection. Weapons
    /// without `RandomRolls` and descriptors missing a hash or name are skipped.
    pub fn build(dataset: &RawDataset) -> Option<Self> {
        let weapons = dataset.weapons()?;
        let mut index = PerkNameIndex::default();

        for weapon in weapons.values() {
            let Some(columns) = socket_columns(weapon) else {
                continue;
            };
            index.weapons_processed += 1;

            for column in columns {
                for perk in column.iter().filter_map(PerkDescriptor::from_value) {
                    index.record(perk.name, perk.item_hash);
                }
            }
        }

        Some(index)
    }

    /// Record a hash under a name, ignoring hashes already recorded for it
    pub fn record(&mut self, name: &str, hash: ItemHash) {
        let slot = match self.positions.get(name) {
            Some(&slot) => slot,
            None => {
                self.names.push((name.to_string(), Vec::new()));
                self.positions.insert(name.to_string(), self.names.len() - 1);
                self.names.len() - 1
            }
        };

        let hashes = &mut self.names[slot].1;
        if !hashes.contains(&hash) {
            hashes.push(hash);
        }
    }

    /// Hashes observed for a name
    pub fn hashes(&self, name: &str) -> Option<&[ItemHash]> {
        self.positions
            .get(name)
            .map(|&slot| self.names[slot].1.as_slice())
    }

    /// Number of distinct perk names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Weapons that had a random roll structure
    pub fn weapons_processed(&self) -> usize {
        self.weapons_processed
    }

    /// Names in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ItemHash])> {
        self.names
            .iter()
            .map(|(name, hashes)| (name.as_str(), hashes.as_slice()))
    }

    /// Names with more than two hashes (noisy data, excluded from the mapping)
    pub fn ambiguous(&self) -> impl Iterator<Item = (&str, &[ItemHash])> {
        self.iter().filter(|(_, hashes)| hashes.len() > 2)
    }

    /// Build the mapping from every name with exactly two hashes
    pub fn to_mapping(&self, policy: MappingPolicy) -> StandardToEnhancedMap {
        let mut mapping = StandardToEnhancedMap::default();

        for (name, hashes) in self.iter() {
            match hashes {
                [first, second] => {
                    let (standard, enhanced) = policy.assign(*first, *second);
                    if let Some(previous) = mapping.insert(standard, enhanced) {
                        tracing::warn!(
                            "Perk \"{}\" remaps {} (was {}, now {})",
                            name,
                            standard,
                            previous,
                            enhanced
                        );
                    }
                }
                _ if hashes.len() > 2 => {
                    tracing::warn!(
                        "Found {} versions of \"{}\" - expected 2. Hashes: {:?}",
                        hashes.len(),
                        name,
                        hashes
                    );
                }
                _ => {}
            }
        }

        mapping
    }
}

/// Extract the standard -> enhanced mapping from a raw dataset
///
/// A dataset without a `Weapons` collection yields an empty mapping and an
/// error log line rather than a failure.
pub fn extract_standard_to_enhanced(
    dataset: &RawDataset,
    policy: MappingPolicy,
) -> StandardToEnhancedMap {
    let Some(index) = PerkNameIndex::build(dataset) else {
        tracing::error!("No \"Weapons\" key found in the data file");
        return StandardToEnhancedMap::default();
    };

    let mapping = index.to_mapping(policy);

    tracing::info!(
        "Processed {} weapons with random rolls ({} unique perk names)",
        index.weapons_processed(),
        index.len()
    );
    tracing::info!(
        "Found {} standard-to-enhanced mappings using {} policy",
        mapping.len(),
        policy
    );

    mapping
}

/// Standard perk hash -> enhanced perk hash.
///
/// Serialized as a JSON object of decimal strings to decimal strings, keys
/// in ascending numeric order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardToEnhancedMap {
    forward: BTreeMap<ItemHash, ItemHash>,
}

impl StandardToEnhancedMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair, returning the enhanced hash it replaced
    pub fn insert(&mut self, standard: ItemHash, enhanced: ItemHash) -> Option<ItemHash> {
        self.forward.insert(standard, enhanced)
    }

    /// Enhanced variant of a standard perk
    pub fn enhanced_for(&self, standard: ItemHash) -> Option<ItemHash> {
        self.forward.get(&standard).copied()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Pairs in ascending standard-hash order
    pub fn iter(&self) -> impl Iterator<Item = (ItemHash, ItemHash)> + '_ {
        self.forward.iter().map(|(s, e)| (*s, *e))
    }

    /// Enhanced -> standard index
    pub fn invert(&self) -> HashMap<ItemHash, ItemHash> {
        self.forward.iter().map(|(s, e)| (*e, *s)).collect()
    }

    pub fn from_json(json: &str) -> Result<Self, MappingError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty-printed JSON with two-space indentation
    pub fn to_json_pretty(&self) -> Result<String, MappingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a mapping file
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write a mapping file, replacing any previous contents
    pub fn save(&self, path: &Path) -> Result<(), MappingError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

impl FromIterator<(ItemHash, ItemHash)> for StandardToEnhancedMap {
    fn from_iter<I: IntoIterator<Item = (ItemHash, ItemHash)>>(iter: I) -> Self {
        StandardToEnhancedMap {
            forward: iter.into_iter().collect(),
        }
    }
}

impl Serialize for StandardToEnhancedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.forward.len()))?;
        for (standard, enhanced) in &self.forward {
            map.serialize_entry(&standard.to_string(), &enhanced.to_string())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StandardToEnhancedMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut forward = BTreeMap::new();
        for (standard, enhanced) in raw {
            let parse = |s: &str| {
                s.parse::<ItemHash>()
                    .map_err(|_| <D::Error as de::Error>::custom(format!("invalid perk hash \"{}\"", s)))
            };
            forward.insert(parse(&standard)?, parse(&enhanced)?);
        }
        Ok(StandardToEnhancedMap { forward })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    fn dataset(value: serde_json::Value) -> RawDataset {
        RawDataset::from_value(value).unwrap()
    }

    #[test]
    fn test_two_hashes_one_name_ascending() {
        let data = dataset(json!({
            "Weapons": {
                "1": {"RandomRolls": [[
                    {"ItemHash": 200, "Name": "Fast"},
                    {"ItemHash": 100, "Name": "Fast"}
                ]]}
            }
        }));

        let mapping = extract_standard_to_enhanced(&data, MappingPolicy::AscendingHash);
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.enhanced_for(100), Some(200));
        assert_eq!(mapping.to_json_pretty().unwrap(), "{\n  \"100\": \"200\"\n}");
    }

    #[test]
    fn test_first_seen_enhanced_policy() {
        let data = dataset(json!({
            "Weapons": {
                "1": {"RandomRolls": [[
                    {"ItemHash": 100, "Name": "Fast"},
                    {"ItemHash": 200, "Name": "Fast"}
                ]]}
            }
        }));

        let mapping = extract_standard_to_enhanced(&data, MappingPolicy::FirstSeenEnhanced);
        assert_eq!(mapping.enhanced_for(200), Some(100));
        assert_eq!(mapping.enhanced_for(100), None);
    }

    #[test]
    fn test_excludes_single_and_ambiguous_names() {
        let data = dataset(json!({
            "Weapons": {
                "1": {"RandomRolls": [
                    [{"ItemHash": 1, "Name": "Lonely"}],
                    [
                        {"ItemHash": 10, "Name": "Noisy"},
                        {"ItemHash": 11, "Name": "Noisy"}
                    ]
                ]},
                "2": {"RandomRolls": [
                    [{"ItemHash": 12, "Name": "Noisy"}],
                    [
                        {"ItemHash": 20, "Name": "Pair"},
                        {"ItemHash": 21, "Name": "Pair"}
                    ]
                ]}
            }
        }));

        let index = PerkNameIndex::build(&data).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.weapons_processed(), 2);
        assert_eq!(index.ambiguous().count(), 1);

        let mapping = index.to_mapping(MappingPolicy::AscendingHash);
        assert_eq!(mapping.iter().collect::<Vec<_>>(), vec![(20, 21)]);
    }

    /// Collects formatted log output for assertions
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_warns_on_ambiguous_name() {
        let mut index = PerkNameIndex::default();
        for hash in [10, 11, 12] {
            index.record("Noisy", hash);
        }
        index.record("Pair", 20);
        index.record("Pair", 21);

        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let mapping = tracing::subscriber::with_default(subscriber, || {
            index.to_mapping(MappingPolicy::AscendingHash)
        });

        assert_eq!(mapping.len(), 1);
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("Found 3 versions of \"Noisy\" - expected 2. Hashes: [10, 11, 12]"));
        assert!(!output.contains("Pair"));
    }

    #[test]
    fn test_duplicate_hashes_across_weapons_counted_once() {
        let data = dataset(json!({
            "Weapons": {
                "1": {"RandomRolls": [[
                    {"ItemHash": 5, "Name": "Rampage"},
                    {"ItemHash": 6, "Name": "Rampage"}
                ]]},
                "2": {"RandomRolls": [[
                    {"ItemHash": 6, "Name": "Rampage"},
                    {"ItemHash": 5, "Name": "Rampage"}
                ]]}
            }
        }));

        let index = PerkNameIndex::build(&data).unwrap();
        assert_eq!(index.hashes("Rampage"), Some(&[5, 6][..]));
        assert_eq!(index.to_mapping(MappingPolicy::AscendingHash).len(), 1);
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let data = dataset(json!({
            "Weapons": {
                "1": {"RandomRolls": [[
                    {"ItemHash": 5, "Name": "Outlaw"},
                    {"Name": "Outlaw"},
                    {"ItemHash": 7},
                    {"ItemHash": 6, "Name": "Outlaw"}
                ], "not a column"]},
                "2": {"Name": "no rolls"},
                "3": {"RandomRolls": null}
            }
        }));

        let index = PerkNameIndex::build(&data).unwrap();
        assert_eq!(index.weapons_processed(), 1);
        assert_eq!(index.hashes("Outlaw"), Some(&[5, 6][..]));
    }

    #[test]
    fn test_missing_weapons_yields_empty_mapping() {
        let data = dataset(json!({"PerkStats": {}}));
        assert!(PerkNameIndex::build(&data).is_none());
        assert!(extract_standard_to_enhanced(&data, MappingPolicy::default()).is_empty());
    }

    #[test]
    fn test_invert() {
        let mapping: StandardToEnhancedMap = [(1, 2), (3, 4)].into_iter().collect();
        let inverted = mapping.invert();
        assert_eq!(inverted.get(&2), Some(&1));
        assert_eq!(inverted.get(&4), Some(&3));
        assert_eq!(inverted.get(&1), None);
    }

    #[test]
    fn test_json_keys_in_numeric_order() {
        let mapping: StandardToEnhancedMap = [(1000, 1), (99, 2)].into_iter().collect();
        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, r#"{"99":"2","1000":"1"}"#);
    }

    #[test]
    fn test_from_json_rejects_non_numeric() {
        assert!(StandardToEnhancedMap::from_json(r#"{"12": "abc"}"#).is_err());
        let mapping = StandardToEnhancedMap::from_json(r#"{"12": "34"}"#).unwrap();
        assert_eq!(mapping.enhanced_for(12), Some(34));
    }

    #[test]
    fn test_save_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("d2").join("trait-to-enhanced-trait.json");

        let first: StandardToEnhancedMap = [(1, 2), (3, 4)].into_iter().collect();
        first.save(&path).unwrap();
        let second: StandardToEnhancedMap = [(5, 6)].into_iter().collect();
        second.save(&path).unwrap();

        assert_eq!(StandardToEnhancedMap::load(&path).unwrap(), second);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "ascending-hash".parse::<MappingPolicy>().unwrap(),
            MappingPolicy::AscendingHash
        );
        assert_eq!(
            "first-seen".parse::<MappingPolicy>().unwrap(),
            MappingPolicy::FirstSeenEnhanced
        );
        assert!("newest".parse::<MappingPolicy>().is_err());
        assert_eq!(MappingPolicy::FirstSeenEnhanced.to_string(), "first-seen-enhanced");
    }
}
