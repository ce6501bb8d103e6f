//! Query result types.
//!
//! These are what consumers see: plain records in camelCase JSON, with
//! `None` meaning the ranking provider has nothing for that question.

use serde::{Deserialize, Serialize};

use crate::stats::{PerkStat, ReviewStat, TraitCombo};
use crate::ItemHash;

/// Rank of one perk (or masterwork stat perk) on a weapon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerkRank {
    pub rank: u32,
    pub count: u32,
    pub perk_hash: ItemHash,
    pub perk_enhanced_hash: Option<ItemHash>,
    pub show: bool,
    /// Provider's perk column index, when recorded
    pub perk_index: Option<u32>,
    /// Socket column the entry was found in (always 0 for masterworks)
    pub column: usize,
}

impl PerkRank {
    pub(crate) fn from_stat(stat: &PerkStat, column: usize) -> Self {
        PerkRank {
            rank: stat.rank,
            count: stat.count,
            perk_hash: stat.perk_hash,
            perk_enhanced_hash: stat.perk_enhanced_hash,
            show: stat.show,
            perk_index: stat.perk_index,
            column,
        }
    }
}

/// Rank of a perk pair in a weapon's trait columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitComboRank {
    /// Tier number derived from stored position (1-based)
    pub rank: u32,
    /// Position of the matched entry within its tier (0..4)
    pub index_in_rank: usize,
    pub count: u32,
    pub perk_a_hash: ItemHash,
    pub perk_a_enhanced_hash: Option<ItemHash>,
    pub perk_b_hash: ItemHash,
    pub perk_b_enhanced_hash: Option<ItemHash>,
    pub show: bool,
    pub date_saved: String,
}

impl TraitComboRank {
    pub(crate) fn from_combo(combo: &TraitCombo, rank: u32, index_in_rank: usize) -> Self {
        TraitComboRank {
            rank,
            index_in_rank,
            count: combo.count,
            perk_a_hash: combo.perk_a_hash,
            perk_a_enhanced_hash: combo.perk_a_enhanced_hash,
            perk_b_hash: combo.perk_b_hash,
            perk_b_enhanced_hash: combo.perk_b_enhanced_hash,
            show: combo.show,
            date_saved: combo.date_saved.clone(),
        }
    }
}

/// A visible combo for "top combos" listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitComboSummary {
    pub rank: u32,
    pub perk_a_hash: ItemHash,
    pub perk_a_enhanced_hash: Option<ItemHash>,
    pub perk_b_hash: ItemHash,
    pub perk_b_enhanced_hash: Option<ItemHash>,
    pub count: u32,
}

/// Best-ranked combo among candidate perks, with the perks to plug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestTraitCombo {
    pub combo: TraitComboRank,
    pub perk_a: ItemHash,
    pub perk_b: ItemHash,
}

/// Aggregate community review scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub review_count: u32,
    pub pve_average: f64,
    pub pvp_average: f64,
    pub overall_average: f64,
}

impl From<&ReviewStat> for ReviewSummary {
    fn from(stat: &ReviewStat) -> Self {
        ReviewSummary {
            review_count: stat.review_count,
            pve_average: stat.pve_average,
            pvp_average: stat.pvp_average,
            overall_average: stat.overall_average,
        }
    }
}

/// Rank of a perk supplied to [`crate::RankingEngine::get_weapon_data`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponPerkRank {
    /// The hash as supplied by the caller
    pub perk_hash: ItemHash,
    pub rank: u32,
    pub count: u32,
    pub perk_enhanced_hash: Option<ItemHash>,
    pub show: bool,
}

/// Everything known about one weapon roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponRankingData {
    pub item_hash: ItemHash,
    pub perk_rankings: Vec<WeaponPerkRank>,
    pub trait_combo_ranking: Option<TraitComboRank>,
    pub masterwork_ranking: Option<PerkRank>,
    pub review_summary: Option<ReviewSummary>,
}

/// Display band for a review average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingTier {
    Excellent,
    Good,
    Average,
    Poor,
    Terrible,
}

impl RatingTier {
    pub fn from_average(average: f64) -> Self {
        if average >= 4.5 {
            Self::Excellent
        } else if average >= 4.0 {
            Self::Good
        } else if average >= 3.0 {
            Self::Average
        } else if average >= 2.0 {
            Self::Poor
        } else {
            Self::Terrible
        }
    }
}

impl std::fmt::Display for RatingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Good => write!(f, "good"),
            Self::Average => write!(f, "average"),
            Self::Poor => write!(f, "poor"),
            Self::Terrible => write!(f, "terrible"),
        }
    }
}
