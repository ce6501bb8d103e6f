//! # rollrank
//!
//! Weapon roll ranking library - perk variant mapping and community ranking queries.
//!
//! This library provides functionality to:
//! - Read the third-party roll appraiser dataset
//! - Derive the standard -> enhanced perk hash mapping from it
//! - Reduce the dataset to the statistics tables shipped to the runtime
//! - Compress the raw dataset for network transfer
//! - Answer perk, trait combo, masterwork and review queries for a weapon
//!
//! ## Example
//!
//! ```no_run
//! use rollrank::{MappingPolicy, RankingEngine, RawDataset, RollStatistics};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dataset = RawDataset::open("backend/light/rollAppraiserData.json")?;
//! let mapping = rollrank::extract_standard_to_enhanced(&dataset, MappingPolicy::AscendingHash);
//!
//! let reduced = rollrank::reduce_dataset(&dataset);
//! let stats = RollStatistics::from_value(reduced)?;
//!
//! let engine = RankingEngine::new(stats, mapping);
//! if let Some(rank) = engine.get_perk_rank(1363886209, 3619207468) {
//!     println!("Rank {} ({} users)", rank.rank, rank.count);
//! }
//! # Ok(())
//! # }
//! ```

pub mod appraisal;
pub mod compress;
pub mod dataset;
pub mod engine;
pub mod filter;
pub mod loader;
pub mod mapping;
pub mod ranking;
pub mod reduce;
pub mod stats;

/// Destiny item hashes are unsigned 32-bit identifiers.
pub type ItemHash = u32;

#[doc(inline)]
pub use appraisal::{BestPerkChange, PerkColumn, WeaponRoll, TRAIT_COLUMNS};
#[doc(inline)]
pub use compress::{compress_file, compressed_path, CompressError, CompressionReport};
#[doc(inline)]
pub use dataset::{DatasetError, PerkDescriptor, RawDataset};
#[doc(inline)]
pub use engine::RankingEngine;
#[doc(inline)]
pub use filter::{FilterError, FilterField, RangeFilter, RankingFilter};
#[doc(inline)]
pub use loader::{EngineLoader, FileStatsSource, LoadError, StatsSource};
#[cfg(feature = "http")]
#[doc(inline)]
pub use loader::HttpStatsSource;
#[doc(inline)]
pub use mapping::{
    extract_standard_to_enhanced, MappingError, MappingPolicy, PerkNameIndex,
    StandardToEnhancedMap,
};
#[doc(inline)]
pub use ranking::{
    BestTraitCombo, PerkRank, RatingTier, ReviewSummary, TraitComboRank, TraitComboSummary,
    WeaponPerkRank, WeaponRankingData,
};
#[doc(inline)]
pub use reduce::{reduce_dataset, REDUCED_TABLES};
#[doc(inline)]
pub use stats::{PerkStat, ReviewStat, RollStatistics, TraitCombo};

/// Parse a hash the way query callers supply it (decimal string, surrounding whitespace ignored).
pub fn parse_hash(value: &str) -> Option<ItemHash> {
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hash() {
        assert_eq!(parse_hash("3619207468"), Some(3619207468));
        assert_eq!(parse_hash(" 42 "), Some(42));
        assert_eq!(parse_hash("abc"), None);
        assert_eq!(parse_hash("-1"), None);
    }
}
