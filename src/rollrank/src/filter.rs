//! Ranking search filters (`comborank:<=2`, `pvescore:>=4.5`, ...).

use thiserror::Error;

use crate::appraisal::WeaponRoll;
use crate::engine::RankingEngine;
use crate::ranking::ReviewSummary;
use crate::ItemHash;

#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    #[error("Unknown filter keyword: {0}")]
    UnknownKeyword(String),

    #[error("Invalid range expression: {0}")]
    InvalidRange(String),

    #[error("Expected keyword:expression, got {0}")]
    MissingSeparator(String),
}

/// Comparison against a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeFilter {
    Less(f64),
    LessOrEqual(f64),
    Greater(f64),
    GreaterOrEqual(f64),
    Equal(f64),
}

impl RangeFilter {
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Self::Less(n) => value < n,
            Self::LessOrEqual(n) => value <= n,
            Self::Greater(n) => value > n,
            Self::GreaterOrEqual(n) => value >= n,
            Self::Equal(n) => value == n,
        }
    }
}

impl std::str::FromStr for RangeFilter {
    type Err = FilterError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (ctor, rest): (fn(f64) -> RangeFilter, &str) = if let Some(rest) = s.strip_prefix("<=") {
            (Self::LessOrEqual, rest)
        } else if let Some(rest) = s.strip_prefix(">=") {
            (Self::GreaterOrEqual, rest)
        } else if let Some(rest) = s.strip_prefix('<') {
            (Self::Less, rest)
        } else if let Some(rest) = s.strip_prefix('>') {
            (Self::Greater, rest)
        } else if let Some(rest) = s.strip_prefix('=') {
            (Self::Equal, rest)
        } else {
            (Self::Equal, s)
        };

        rest.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(ctor)
            .ok_or_else(|| FilterError::InvalidRange(s.to_string()))
    }
}

/// What a filter compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    /// Rank of the combo plugged into the two trait columns
    ComboRank,
    /// Any option ranked at this perk index (perk1rank = index 2)
    PerkRank(u32),
    ReviewCount,
    PveScore,
    PvpScore,
    OverallScore,
}

impl FilterField {
    pub fn from_keyword(keyword: &str) -> Result<Self, FilterError> {
        match keyword.to_ascii_lowercase().as_str() {
            "comborank" => Ok(Self::ComboRank),
            "perk1rank" => Ok(Self::PerkRank(2)),
            "perk2rank" => Ok(Self::PerkRank(3)),
            "perk3rank" => Ok(Self::PerkRank(4)),
            "perk4rank" => Ok(Self::PerkRank(5)),
            "reviewcount" => Ok(Self::ReviewCount),
            "pvescore" => Ok(Self::PveScore),
            "pvpscore" => Ok(Self::PvpScore),
            "overallscore" => Ok(Self::OverallScore),
            _ => Err(FilterError::UnknownKeyword(keyword.to_string())),
        }
    }
}

/// A parsed `keyword:range` filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingFilter {
    pub field: FilterField,
    pub range: RangeFilter,
}

impl std::str::FromStr for RankingFilter {
    type Err = FilterError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (keyword, expr) = s
            .split_once(':')
            .ok_or_else(|| FilterError::MissingSeparator(s.to_string()))?;
        Ok(RankingFilter {
            field: FilterField::from_keyword(keyword.trim())?,
            range: expr.parse()?,
        })
    }
}

impl RankingFilter {
    /// Evaluate against a roll; weapons without data never match
    pub fn matches(&self, engine: &RankingEngine, roll: &WeaponRoll) -> bool {
        let weapon = roll.item_hash;

        match self.field {
            FilterField::ComboRank => {
                let Some((Some(perk_a), Some(perk_b))) =
                    roll.trait_columns().map(|(a, b)| (a.plugged, b.plugged))
                else {
                    return false;
                };
                engine
                    .get_trait_combo_rank(weapon, perk_a, perk_b)
                    .is_some_and(|combo| self.range.matches(f64::from(combo.rank)))
            }
            FilterField::PerkRank(index) => {
                roll.columns.iter().enumerate().any(|(column, perks)| {
                    perks.candidates().into_iter().any(|perk| {
                        engine.get_perk_rank(weapon, perk).is_some_and(|rank| {
                            let perk_index = rank.perk_index.unwrap_or(column as u32);
                            perk_index == index && self.range.matches(f64::from(rank.rank))
                        })
                    })
                })
            }
            FilterField::ReviewCount => self.review(engine, weapon, |r| f64::from(r.review_count)),
            FilterField::PveScore => self.review(engine, weapon, |r| r.pve_average),
            FilterField::PvpScore => self.review(engine, weapon, |r| r.pvp_average),
            FilterField::OverallScore => self.review(engine, weapon, |r| r.overall_average),
        }
    }

    fn review(
        &self,
        engine: &RankingEngine,
        weapon: ItemHash,
        field: impl Fn(&ReviewSummary) -> f64,
    ) -> bool {
        engine
            .get_review_summary(weapon)
            .is_some_and(|review| self.range.matches(field(&review)))
    }
}
