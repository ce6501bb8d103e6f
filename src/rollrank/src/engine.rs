//! Ranking query engine.
//!
//! A read-only query object over one [`RollStatistics`] snapshot. Ranking
//! data is keyed by whichever perk variant the provider recorded, while a
//! live item may carry the other one, so perk lookups fall back from an
//! enhanced hash to its standard counterpart using the injected mapping.

use std::collections::HashMap;

use crate::mapping::StandardToEnhancedMap;
use crate::ranking::{
    BestTraitCombo, PerkRank, ReviewSummary, TraitComboRank, TraitComboSummary, WeaponPerkRank,
    WeaponRankingData,
};
use crate::stats::{PerkStat, RollStatistics};
use crate::ItemHash;

/// Stored trait combo entries per rank tier.
pub const COMBOS_PER_TIER: usize = 4;

/// Default length of a top combos listing.
pub const DEFAULT_TOP_COMBOS: usize = 5;

/// Query engine over immutable roll statistics.
#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    stats: RollStatistics,
    mapping: StandardToEnhancedMap,
    enhanced_to_standard: HashMap<ItemHash, ItemHash>,
}

impl RankingEngine {
    pub fn new(stats: RollStatistics, mapping: StandardToEnhancedMap) -> Self {
        let enhanced_to_standard = mapping.invert();
        RankingEngine {
            stats,
            mapping,
            enhanced_to_standard,
        }
    }

    /// Engine with all tables empty; every query misses
    pub fn empty(mapping: StandardToEnhancedMap) -> Self {
        Self::new(RollStatistics::empty(), mapping)
    }

    pub fn stats(&self) -> &RollStatistics {
        &self.stats
    }

    pub fn mapping(&self) -> &StandardToEnhancedMap {
        &self.mapping
    }

    /// Standard counterpart of an enhanced perk
    pub fn standard_for(&self, enhanced: ItemHash) -> Option<ItemHash> {
        self.enhanced_to_standard.get(&enhanced).copied()
    }

    /// Rank of a perk on a weapon, bridging enhanced -> standard on a miss
    pub fn get_perk_rank(&self, weapon: ItemHash, perk: ItemHash) -> Option<PerkRank> {
        let columns = self.stats.perk_stats.get(&weapon)?;

        find_in_columns(columns, perk).or_else(|| {
            let standard = self.standard_for(perk)?;
            find_in_columns(columns, standard)
        })
    }

    /// Rank of a masterwork stat perk; masterworks have no enhanced variants
    pub fn get_mw_rank(&self, weapon: ItemHash, mw_perk: ItemHash) -> Option<PerkRank> {
        self.stats
            .mw_stats
            .get(&weapon)?
            .iter()
            .find(|stat| stat.perk_hash == mw_perk)
            .map(|stat| PerkRank::from_stat(stat, 0))
    }

    /// Rank of the perk pair `(perk_a, perk_b)` in a weapon's trait columns
    ///
    /// Stored combos are walked in order; every [`COMBOS_PER_TIER`] entries
    /// make one tier, so the rank comes from position. Each slot matches on
    /// either its standard or enhanced hash, and slots are not swapped. The
    /// returned details come from the first visible entry of the matched
    /// tier, falling back to the matched entry itself.
    pub fn get_trait_combo_rank(
        &self,
        weapon: ItemHash,
        perk_a: ItemHash,
        perk_b: ItemHash,
    ) -> Option<TraitComboRank> {
        let combos = self.stats.trait_stats.get(&weapon)?;

        let (position, matched) = combos
            .iter()
            .enumerate()
            .find(|(_, combo)| combo.matches_a(perk_a) && combo.matches_b(perk_b))?;

        let tier = position / COMBOS_PER_TIER;
        let tier_start = tier * COMBOS_PER_TIER;
        let tier_end = (tier_start + COMBOS_PER_TIER).min(combos.len());
        let display = combos[tier_start..tier_end]
            .iter()
            .find(|combo| combo.show)
            .unwrap_or(matched);

        Some(TraitComboRank::from_combo(
            display,
            tier as u32 + 1,
            position % COMBOS_PER_TIER,
        ))
    }

    /// Community review scores for a weapon
    pub fn get_review_summary(&self, weapon: ItemHash) -> Option<ReviewSummary> {
        self.stats.review_summary.get(&weapon).map(ReviewSummary::from)
    }

    /// Compose every ranking for a roll
    ///
    /// The last two perks are taken as the trait combo pair, so callers must
    /// pass perks in column order. Perks without a rank are left out.
    pub fn get_weapon_data(
        &self,
        weapon: ItemHash,
        perks: &[ItemHash],
        mw_perk: Option<ItemHash>,
    ) -> WeaponRankingData {
        let perk_rankings = perks
            .iter()
            .filter_map(|&perk| {
                let rank = self.get_perk_rank(weapon, perk)?;
                Some(WeaponPerkRank {
                    perk_hash: perk,
                    rank: rank.rank,
                    count: rank.count,
                    perk_enhanced_hash: rank.perk_enhanced_hash,
                    show: rank.show,
                })
            })
            .collect();

        let trait_combo_ranking = match perks {
            [.., perk_a, perk_b] => self.get_trait_combo_rank(weapon, *perk_a, *perk_b),
            _ => None,
        };

        WeaponRankingData {
            item_hash: weapon,
            perk_rankings,
            trait_combo_ranking,
            masterwork_ranking: mw_perk
                .filter(|&mw| mw != 0)
                .and_then(|mw| self.get_mw_rank(weapon, mw)),
            review_summary: self.get_review_summary(weapon),
        }
    }

    /// True if any table has data for the weapon
    pub fn has_data_for_weapon(&self, weapon: ItemHash) -> bool {
        self.stats.contains_weapon(weapon)
    }

    /// Visible combos ordered by the provider's combo rank
    ///
    /// Entries without a stored combo rank use their positional tier rank.
    /// Ties keep stored order.
    pub fn top_trait_combos(&self, weapon: ItemHash, limit: usize) -> Vec<TraitComboSummary> {
        let Some(combos) = self.stats.trait_stats.get(&weapon) else {
            return Vec::new();
        };

        let mut visible: Vec<TraitComboSummary> = combos
            .iter()
            .enumerate()
            .filter(|(_, combo)| combo.show)
            .map(|(position, combo)| TraitComboSummary {
                rank: combo
                    .combo_rank
                    .unwrap_or((position / COMBOS_PER_TIER) as u32 + 1),
                perk_a_hash: combo.perk_a_hash,
                perk_a_enhanced_hash: combo.perk_a_enhanced_hash,
                perk_b_hash: combo.perk_b_hash,
                perk_b_enhanced_hash: combo.perk_b_enhanced_hash,
                count: combo.count,
            })
            .collect();

        visible.sort_by_key(|combo| combo.rank);
        visible.truncate(limit);
        visible
    }

    /// Lowest-ranked combo over every pairing of two candidate columns
    ///
    /// Only the given candidates are ever returned. An enhanced candidate
    /// whose pairing is stored under its standard counterpart is retried with
    /// that counterpart, but the enhanced hash is still the one returned for
    /// plugging. The first pairing found wins ties.
    pub fn best_trait_combo(
        &self,
        weapon: ItemHash,
        column_a: &[ItemHash],
        column_b: &[ItemHash],
    ) -> Option<BestTraitCombo> {
        if !self.stats.trait_stats.contains_key(&weapon) {
            return None;
        }

        let mut best: Option<BestTraitCombo> = None;

        let mut consider = |combo: Option<TraitComboRank>, perk_a: ItemHash, perk_b: ItemHash| {
            if let Some(combo) = combo {
                if best.as_ref().map_or(true, |b| combo.rank < b.combo.rank) {
                    best = Some(BestTraitCombo {
                        combo,
                        perk_a,
                        perk_b,
                    });
                }
            }
        };

        for &perk_a in column_a {
            for &perk_b in column_b {
                consider(self.get_trait_combo_rank(weapon, perk_a, perk_b), perk_a, perk_b);

                let standard_a = self.standard_for(perk_a);
                let standard_b = self.standard_for(perk_b);
                if standard_a.is_some() || standard_b.is_some() {
                    let alt = self.get_trait_combo_rank(
                        weapon,
                        standard_a.unwrap_or(perk_a),
                        standard_b.unwrap_or(perk_b),
                    );
                    consider(alt, perk_a, perk_b);
                }
            }
        }

        best
    }
}

fn find_in_columns(columns: &[Vec<PerkStat>], perk: ItemHash) -> Option<PerkRank> {
    columns.iter().enumerate().find_map(|(column, stats)| {
        stats
            .iter()
            .find(|stat| stat.perk_hash == perk)
            .map(|stat| PerkRank::from_stat(stat, column))
    })
}
