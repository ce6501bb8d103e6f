//! Offline ranking queries against a statistics document

use crate::cli::QueryCommand;
use anyhow::{Context, Result};
use rollrank::{
    PerkRank, RankingEngine, RankingFilter, RatingTier, RollStatistics, StandardToEnhancedMap,
    TraitComboRank, WeaponRoll,
};
use std::fs;
use std::path::Path;

/// Build an engine from a statistics file and an optional mapping file
pub fn load_engine(stats_path: &Path, mapping_path: Option<&Path>) -> Result<RankingEngine> {
    let bytes = fs::read(stats_path)
        .with_context(|| format!("Failed to read statistics from {}", stats_path.display()))?;
    let stats = RollStatistics::from_slice(&bytes)
        .with_context(|| format!("Invalid statistics document {}", stats_path.display()))?;

    let mapping = match mapping_path {
        Some(path) => StandardToEnhancedMap::load(path)
            .with_context(|| format!("Failed to load mapping from {}", path.display()))?,
        None => StandardToEnhancedMap::new(),
    };

    tracing::debug!(mappings = mapping.len(), "Loaded ranking engine");
    Ok(RankingEngine::new(stats, mapping))
}

fn load_roll(path: &Path) -> Result<WeaponRoll> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read roll from {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid roll JSON in {}", path.display()))
}

/// Handle the query command
pub fn handle(engine: &RankingEngine, command: QueryCommand) -> Result<()> {
    match command {
        QueryCommand::Perk { weapon, perk } => {
            print_perk_rank("Perk", perk, engine.get_perk_rank(weapon, perk).as_ref());
        }
        QueryCommand::Mw { weapon, perk } => {
            print_perk_rank("Masterwork", perk, engine.get_mw_rank(weapon, perk).as_ref());
        }
        QueryCommand::Combo {
            weapon,
            perk_a,
            perk_b,
        } => print_combo(engine.get_trait_combo_rank(weapon, perk_a, perk_b).as_ref()),
        QueryCommand::Review { weapon } => review(engine, weapon),
        QueryCommand::Weapon { weapon, perks, mw } => {
            let data = engine.get_weapon_data(weapon, &perks, mw);
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        QueryCommand::TopCombos { weapon, limit } => top_combos(engine, weapon, limit),
        QueryCommand::Best { weapon, a, b } => match engine.best_trait_combo(weapon, &a, &b) {
            Some(best) => {
                println!("Plug {} + {}", best.perk_a, best.perk_b);
                print_combo(Some(&best.combo));
            }
            None => println!("No ranked combo among the candidates"),
        },
        QueryCommand::Appraise { roll } => appraise(engine, &load_roll(&roll)?)?,
        QueryCommand::Filter { roll, filters } => {
            let roll = load_roll(&roll)?;
            let parsed = filters
                .iter()
                .map(|text| {
                    text.parse::<RankingFilter>()
                        .map(|filter| (text, filter))
                        .with_context(|| format!("Bad filter '{}'", text))
                })
                .collect::<Result<Vec<_>>>()?;

            for (text, filter) in parsed {
                let verdict = if filter.matches(engine, &roll) { "match" } else { "no match" };
                println!("{:<24} {}", text, verdict);
            }
        }
    }

    Ok(())
}

fn print_perk_rank(label: &str, perk: u32, rank: Option<&PerkRank>) {
    let Some(rank) = rank else {
        println!("No ranking for {} {}", label.to_lowercase(), perk);
        return;
    };

    println!("{:<12} {}", label, perk);
    println!("{:<12} {}", "Rank", rank.rank);
    println!("{:<12} {}", "Count", rank.count);
    println!("{:<12} {}", "Column", rank.column);
    if let Some(enhanced) = rank.perk_enhanced_hash {
        println!("{:<12} {}", "Enhanced", enhanced);
    }
}

fn print_combo(combo: Option<&TraitComboRank>) {
    let Some(combo) = combo else {
        println!("No ranking for that combo");
        return;
    };

    println!(
        "Tier {} (entry {} of tier), {} users",
        combo.rank,
        combo.index_in_rank + 1,
        combo.count
    );
    println!("  {} + {}", combo.perk_a_hash, combo.perk_b_hash);
    if !combo.date_saved.is_empty() {
        println!("  Saved {}", combo.date_saved);
    }
}

fn review(engine: &RankingEngine, weapon: u32) {
    let Some(summary) = engine.get_review_summary(weapon) else {
        println!("No reviews for weapon {}", weapon);
        return;
    };

    println!("{:<10} {:>6} {:<10}", "Mode", "Score", "Rating");
    println!("{}", "-".repeat(28));
    for (mode, average) in [
        ("PvE", summary.pve_average),
        ("PvP", summary.pvp_average),
        ("Overall", summary.overall_average),
    ] {
        println!(
            "{:<10} {:>6.2} {:<10}",
            mode,
            average,
            RatingTier::from_average(average).to_string()
        );
    }
    println!("\n{} reviews", summary.review_count);
}

fn top_combos(engine: &RankingEngine, weapon: u32, limit: usize) {
    let combos = engine.top_trait_combos(weapon, limit);
    if combos.is_empty() {
        println!("No trait combos for weapon {}", weapon);
        return;
    }

    println!("{:<6} {:<12} {:<12} {:>8}", "Rank", "Perk A", "Perk B", "Count");
    println!("{}", "-".repeat(41));
    for combo in combos {
        println!(
            "{:<6} {:<12} {:<12} {:>8}",
            combo.rank, combo.perk_a_hash, combo.perk_b_hash, combo.count
        );
    }
}

fn appraise(engine: &RankingEngine, roll: &WeaponRoll) -> Result<()> {
    if !engine.has_data_for_weapon(roll.item_hash) {
        println!("No ranking data for weapon {}", roll.item_hash);
        return Ok(());
    }

    let data = engine.appraise(roll);
    println!("{}", serde_json::to_string_pretty(&data)?);

    let changes = engine.best_perks(roll);
    if !changes.is_empty() {
        println!("\nSuggested trait changes:");
        for change in changes {
            let current = change
                .current
                .map_or_else(|| "-".to_string(), |h| h.to_string());
            println!("  column {}: {} -> {}", change.column, current, change.best);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stats_file(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("stats.json");
        let stats = json!({
            "PerkStats": {"1": [[{"PerkHash": 100, "Rank": 1, "Count": 4}]]},
            "TraitStats": {"1": [{"Perk4Hash": 100, "Perk5Hash": 300, "Count": 2, "Show": true}]},
            "ReviewSummary": {"1": {"ReviewCount": 2, "PVEAvg": 4.5, "PVPAvg": 2.5, "OverallAvg": 3.5}}
        });
        fs::write(&path, stats.to_string()).unwrap();
        path
    }

    #[test]
    fn test_load_engine_with_mapping() {
        let temp_dir = tempfile::tempdir().unwrap();
        let stats = stats_file(temp_dir.path());
        let mapping_path = temp_dir.path().join("mapping.json");
        fs::write(&mapping_path, r#"{"100": "200"}"#).unwrap();

        let engine = load_engine(&stats, Some(&mapping_path)).unwrap();
        assert_eq!(engine.get_perk_rank(1, 200).unwrap().rank, 1);
        assert_eq!(engine.get_trait_combo_rank(1, 100, 300).unwrap().rank, 1);
    }

    #[test]
    fn test_load_engine_missing_stats() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(load_engine(&temp_dir.path().join("nope.json"), None).is_err());
    }

    #[test]
    fn test_handle_queries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let engine = load_engine(&stats_file(temp_dir.path()), None).unwrap();

        let roll_path = temp_dir.path().join("roll.json");
        fs::write(
            &roll_path,
            r#"{"itemHash": 1, "columns": [{}, {}, {"plugged": 100, "options": [100]}, {"plugged": 300}]}"#,
        )
        .unwrap();

        handle(&engine, QueryCommand::Review { weapon: 1 }).unwrap();
        handle(&engine, QueryCommand::TopCombos { weapon: 1, limit: 5 }).unwrap();
        handle(&engine, QueryCommand::Appraise { roll: roll_path.clone() }).unwrap();
        handle(
            &engine,
            QueryCommand::Filter {
                roll: roll_path.clone(),
                filters: vec!["comborank:1".to_string()],
            },
        )
        .unwrap();
        assert!(handle(
            &engine,
            QueryCommand::Filter {
                roll: roll_path,
                filters: vec!["bogus:1".to_string()],
            },
        )
        .is_err());
    }
}
