//! Appraising a weapon's actual sockets.
//!
//! [`WeaponRoll`] is the read-only view of an item's perk sockets that the
//! inventory side hands over: per column, the plugged perk and the perks
//! that could be plugged instead.

use serde::{Deserialize, Serialize};

use crate::engine::RankingEngine;
use crate::ranking::WeaponRankingData;
use crate::ItemHash;

/// Perk column indexes holding the two trait perks.
pub const TRAIT_COLUMNS: (usize, usize) = (2, 3);

/// One perk socket column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerkColumn {
    pub plugged: Option<ItemHash>,
    #[serde(default)]
    pub options: Vec<ItemHash>,
}

impl PerkColumn {
    /// Options plus the plugged perk, without duplicates
    pub fn candidates(&self) -> Vec<ItemHash> {
        let mut candidates = self.options.clone();
        if let Some(plugged) = self.plugged {
            if !candidates.contains(&plugged) {
                candidates.push(plugged);
            }
        }
        candidates
    }
}

/// A weapon instance as seen through its sockets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponRoll {
    pub item_hash: ItemHash,
    #[serde(default)]
    pub columns: Vec<PerkColumn>,
    pub masterwork: Option<ItemHash>,
}

impl WeaponRoll {
    /// Plugged perks in column order
    pub fn plugged_perks(&self) -> Vec<ItemHash> {
        self.columns.iter().filter_map(|c| c.plugged).collect()
    }

    /// The two trait columns, if the weapon has them
    pub fn trait_columns(&self) -> Option<(&PerkColumn, &PerkColumn)> {
        let (a, b) = TRAIT_COLUMNS;
        Some((self.columns.get(a)?, self.columns.get(b)?))
    }
}

/// A plug change suggested for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestPerkChange {
    pub column: usize,
    pub current: Option<ItemHash>,
    pub best: ItemHash,
}

impl RankingEngine {
    /// Rankings for the perks currently plugged into a roll
    ///
    /// The trait combo is taken from the plugged perks of the trait columns
    /// when both are plugged, rather than from the last two plugged perks.
    pub fn appraise(&self, roll: &WeaponRoll) -> WeaponRankingData {
        let mut data = self.get_weapon_data(roll.item_hash, &roll.plugged_perks(), roll.masterwork);

        if let Some((a, b)) = roll.trait_columns() {
            if let (Some(perk_a), Some(perk_b)) = (a.plugged, b.plugged) {
                data.trait_combo_ranking = self.get_trait_combo_rank(roll.item_hash, perk_a, perk_b);
            }
        }

        data
    }

    /// Plug changes that move the trait columns to the best ranked combo
    ///
    /// Empty when the weapon has no combo data, no ranked pairing exists, or
    /// the best combo is already plugged.
    pub fn best_perks(&self, roll: &WeaponRoll) -> Vec<BestPerkChange> {
        let Some((a, b)) = roll.trait_columns() else {
            return Vec::new();
        };
        let (candidates_a, candidates_b) = (a.candidates(), b.candidates());
        if candidates_a.is_empty() || candidates_b.is_empty() {
            return Vec::new();
        }

        let Some(best) = self.best_trait_combo(roll.item_hash, &candidates_a, &candidates_b) else {
            return Vec::new();
        };

        let (col_a, col_b) = TRAIT_COLUMNS;
        [(col_a, a, best.perk_a), (col_b, b, best.perk_b)]
            .into_iter()
            .filter(|(_, column, target)| column.plugged != Some(*target))
            .map(|(index, column, target)| BestPerkChange {
                column: index,
                current: column.plugged,
                best: target,
            })
            .collect()
    }
}
