//! Typed roll statistics tables.
//!
//! These are the four tables of the reduced dataset, deserialized at the
//! trust boundary so query code never sees a missing or mistyped field.
//! Numeric fields accept either JSON numbers or numeric strings, since the
//! upstream provider is not consistent about which it emits.
//!
//! Trait combo entries for a weapon may arrive as an array or as a keyed
//! object. Either way they are kept in stored order: every 4 consecutive
//! entries form one rank tier, and that order is the only source of the
//! positional rank. The provider is trusted to honor this; it cannot be
//! checked here.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::ItemHash;

/// Per-weapon statistics tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollStatistics {
    /// Weapon -> socket columns -> perk rank entries
    #[serde(rename = "PerkStats", default, deserialize_with = "nullable")]
    pub perk_stats: HashMap<ItemHash, Vec<Vec<PerkStat>>>,

    /// Weapon -> trait combo entries in stored order
    #[serde(rename = "TraitStats", default, deserialize_with = "trait_tables")]
    pub trait_stats: HashMap<ItemHash, Vec<TraitCombo>>,

    /// Weapon -> masterwork stat perk rank entries
    #[serde(rename = "MWStats", default, deserialize_with = "nullable")]
    pub mw_stats: HashMap<ItemHash, Vec<PerkStat>>,

    /// Weapon -> aggregate community review
    #[serde(rename = "ReviewSummary", default, deserialize_with = "nullable")]
    pub review_summary: HashMap<ItemHash, ReviewStat>,
}

impl RollStatistics {
    /// Statistics with every table empty
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate a parsed reduced dataset
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// True if any table has an entry for the weapon
    pub fn contains_weapon(&self, weapon: ItemHash) -> bool {
        self.perk_stats.contains_key(&weapon)
            || self.trait_stats.contains_key(&weapon)
            || self.mw_stats.contains_key(&weapon)
            || self.review_summary.contains_key(&weapon)
    }

    pub fn is_empty(&self) -> bool {
        self.perk_stats.is_empty()
            && self.trait_stats.is_empty()
            && self.mw_stats.is_empty()
            && self.review_summary.is_empty()
    }
}

/// Rank entry for a perk or masterwork stat perk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerkStat {
    /// Lower is better (more used)
    #[serde(rename = "Rank", deserialize_with = "lenient_u32")]
    pub rank: u32,

    #[serde(rename = "Count", default, deserialize_with = "lenient_u32")]
    pub count: u32,

    #[serde(rename = "PerkHash", deserialize_with = "lenient_u32")]
    pub perk_hash: ItemHash,

    #[serde(
        rename = "PerkEnhancedHash",
        default,
        deserialize_with = "lenient_opt_hash"
    )]
    pub perk_enhanced_hash: Option<ItemHash>,

    #[serde(rename = "Show", default)]
    pub show: bool,

    /// Perk column index as recorded by the provider
    #[serde(rename = "PerkIDX", default, deserialize_with = "lenient_opt_hash")]
    pub perk_index: Option<u32>,
}

/// One stored perk pair of a weapon's trait columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitCombo {
    /// Provider's combo rank, when present
    #[serde(rename = "comboRank", default, deserialize_with = "lenient_opt_hash")]
    pub combo_rank: Option<u32>,

    #[serde(rename = "Perk4Hash", deserialize_with = "lenient_u32")]
    pub perk_a_hash: ItemHash,

    #[serde(
        rename = "Perk4EnhancedHash",
        default,
        deserialize_with = "lenient_opt_hash"
    )]
    pub perk_a_enhanced_hash: Option<ItemHash>,

    #[serde(rename = "Perk5Hash", deserialize_with = "lenient_u32")]
    pub perk_b_hash: ItemHash,

    #[serde(
        rename = "Perk5EnhancedHash",
        default,
        deserialize_with = "lenient_opt_hash"
    )]
    pub perk_b_enhanced_hash: Option<ItemHash>,

    #[serde(rename = "Count", default, deserialize_with = "lenient_u32")]
    pub count: u32,

    #[serde(rename = "Show", default)]
    pub show: bool,

    #[serde(rename = "DateSaved", default)]
    pub date_saved: String,
}

impl TraitCombo {
    /// Slot A matches if the hash is the stored standard or enhanced hash
    pub fn matches_a(&self, hash: ItemHash) -> bool {
        self.perk_a_hash == hash || self.perk_a_enhanced_hash == Some(hash)
    }

    /// Slot B matches if the hash is the stored standard or enhanced hash
    pub fn matches_b(&self, hash: ItemHash) -> bool {
        self.perk_b_hash == hash || self.perk_b_enhanced_hash == Some(hash)
    }
}

/// Aggregate community review for a weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStat {
    #[serde(rename = "ReviewCount", default, deserialize_with = "lenient_u32")]
    pub review_count: u32,

    #[serde(rename = "PVEAvg", default, deserialize_with = "lenient_f64")]
    pub pve_average: f64,

    #[serde(rename = "PVPAvg", default, deserialize_with = "lenient_f64")]
    pub pvp_average: f64,

    #[serde(rename = "OverallAvg", default, deserialize_with = "lenient_f64")]
    pub overall_average: f64,
}

// ============================================================================
// Lenient field deserializers
// ============================================================================

fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(0.0),
        ref other => number_from(other)
            .ok_or_else(|| de::Error::custom(format!("expected a number, found {}", other))),
    }
}

fn to_u32<E: de::Error>(value: &Value) -> Result<u32, E> {
    number_from(value)
        .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32)
        .ok_or_else(|| E::custom(format!("expected an unsigned 32-bit integer, found {}", value)))
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    to_u32(&value)
}

/// Null, absent, and zero all mean "no hash"
fn lenient_opt_hash<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    to_u32(&value).map(|n| Some(n).filter(|n| *n != 0))
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn trait_tables<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<HashMap<ItemHash, Vec<TraitCombo>>, D::Error> {
    let tables: Option<HashMap<ItemHash, Value>> = Option::deserialize(deserializer)?;
    let mut out = HashMap::new();

    for (weapon, entries) in tables.unwrap_or_default() {
        let entries: Vec<Value> = match entries {
            Value::Array(list) => list,
            Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(de::Error::custom(format!(
                    "TraitStats for weapon {} must be an array or object, found {}",
                    weapon, other
                )))
            }
        };

        let combos = entries
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<TraitCombo>, _>>()
            .map_err(|e| {
                <D::Error as de::Error>::custom(format!("TraitStats for weapon {}: {}", weapon, e))
            })?;
        out.insert(weapon, combos);
    }

    Ok(out)
}
