//! Build-time pipeline: fetch, mapping, reduce, compress

use anyhow::{bail, Context, Result};
use rollrank::{MappingPolicy, RawDataset, StandardToEnhancedMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Resolved settings for one pipeline run
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub input: PathBuf,
    pub mapping_output: PathBuf,
    pub reduced_output: PathBuf,
    pub policy: MappingPolicy,
    /// `None` skips the refresh step
    pub fetch_command: Option<Vec<String>>,
}

/// Run the upstream fetch command and wait for it
///
/// Failure is fatal: the rest of the pipeline would run on stale data.
pub fn refresh(command: &[String]) -> Result<()> {
    let (program, args) = command.split_first().context("Fetch command is empty")?;

    tracing::info!("Fetching latest data: {}", command.join(" "));
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to run fetch command {}", program))?;

    if !status.success() {
        bail!("Fetch command failed with {}", status);
    }

    tracing::info!("Fetch finished");
    Ok(())
}

fn open_dataset(input: &Path) -> Result<RawDataset> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }
    RawDataset::open(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn write_mapping(dataset: &RawDataset, output: &Path, policy: MappingPolicy) -> Result<StandardToEnhancedMap> {
    tracing::info!("Using {} mapping policy", policy);
    let mapping = rollrank::extract_standard_to_enhanced(dataset, policy);

    mapping
        .save(output)
        .with_context(|| format!("Failed to write mapping to {}", output.display()))?;
    tracing::info!("Wrote {} mappings to {}", mapping.len(), output.display());

    Ok(mapping)
}

fn write_reduced(dataset: &RawDataset, output: &Path) -> Result<u64> {
    let reduced = rollrank::reduce_dataset(dataset);
    let json = serde_json::to_string_pretty(&reduced).context("Failed to serialize reduced dataset")?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(output, &json)
        .with_context(|| format!("Failed to write reduced dataset to {}", output.display()))?;

    Ok(json.len() as u64)
}

/// Compress the input; failures are logged, never returned
fn compress_logged(input: &Path) -> Option<rollrank::CompressionReport> {
    match rollrank::compress_file(input) {
        Ok(report) => {
            tracing::info!(
                "Compressed {} -> {} ({:.1}% reduction)",
                input.display(),
                report.output.display(),
                report.reduction_percent()
            );
            Some(report)
        }
        Err(e) => {
            tracing::error!("Compression failed: {}", e);
            None
        }
    }
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

/// What one pipeline run produced
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub input_size: u64,
    pub reduced_size: u64,
    pub weapons: usize,
    pub mappings: usize,
    /// `None` when compression failed
    pub compressed: Option<rollrank::CompressionReport>,
}

impl GenerateReport {
    /// Reduced extract size reduction as a percentage of the input
    pub fn reduction_percent(&self) -> f64 {
        if self.input_size == 0 {
            return 0.0;
        }
        (1.0 - self.reduced_size as f64 / self.input_size as f64) * 100.0
    }

    fn print(&self, input: &Path) {
        println!();
        println!("{:<22} {}", "Input:", input.display());
        println!("{:<22} {:.2} MB", "Input size:", megabytes(self.input_size));
        println!("{:<22} {:.2} MB", "Reduced size:", megabytes(self.reduced_size));
        println!("{:<22} {:.1}%", "Size reduction:", self.reduction_percent());
        println!("{:<22} {}", "Weapons:", self.weapons);
        println!("{:<22} {}", "Perk mappings:", self.mappings);
        match &self.compressed {
            Some(report) => println!(
                "{:<22} {:.2} MB ({:.1}% reduction)",
                "Compressed size:",
                megabytes(report.compressed_size),
                report.reduction_percent()
            ),
            None => println!("{:<22} failed (see log)", "Compressed size:"),
        }
    }
}

/// Full pipeline
pub fn generate(options: &GenerateOptions) -> Result<GenerateReport> {
    match &options.fetch_command {
        Some(command) => refresh(command)?,
        None => tracing::info!("--no-fetch given, skipping fetch"),
    }

    let dataset = open_dataset(&options.input)?;
    let input_size = fs::metadata(&options.input)
        .with_context(|| format!("Failed to stat {}", options.input.display()))?
        .len();

    let mapping = write_mapping(&dataset, &options.mapping_output, options.policy)?;
    let reduced_size = write_reduced(&dataset, &options.reduced_output)?;

    let report = GenerateReport {
        input_size,
        reduced_size,
        weapons: dataset.weapons().map_or(0, |w| w.len()),
        mappings: mapping.len(),
        compressed: compress_logged(&options.input),
    };
    report.print(&options.input);

    Ok(report)
}

pub fn mapping(input: &Path, output: &Path, policy: MappingPolicy) -> Result<()> {
    let dataset = open_dataset(input)?;
    let mapping = write_mapping(&dataset, output, policy)?;
    println!("Generated {} standard-to-enhanced perk mappings", mapping.len());
    Ok(())
}

pub fn reduce(input: &Path, output: &Path) -> Result<()> {
    let dataset = open_dataset(input)?;
    let size = write_reduced(&dataset, output)?;
    println!("Wrote {} ({:.2} MB)", output.display(), megabytes(size));
    Ok(())
}

pub fn compress(input: &Path) -> Result<()> {
    let report = rollrank::compress_file(input)
        .with_context(|| format!("Failed to compress {}", input.display()))?;
    println!(
        "Compressed {} -> {}",
        input.display(),
        report.output.display()
    );
    println!("Original size:   {:.2} MB", megabytes(report.original_size));
    println!("Compressed size: {:.2} MB", megabytes(report.compressed_size));
    println!("Compression ratio: {:.1}% reduction", report.reduction_percent());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn write_dataset(dir: &Path) -> PathBuf {
        let input = dir.join("rollAppraiserData.json");
        let data = json!({
            "Weapons": {
                "1": {"RandomRolls": [[
                    {"ItemHash": 200, "Name": "Outlaw"},
                    {"ItemHash": 100, "Name": "Outlaw"},
                    {"ItemHash": 300, "Name": "Rampage"}
                ]]}
            },
            "PerkStats": {"1": [[{"PerkHash": 100, "Rank": 1, "Count": 4}]]},
            "MWStats": null,
            "Extra": [1, 2, 3]
        });
        fs::write(&input, serde_json::to_string(&data).unwrap()).unwrap();
        input
    }

    fn options(dir: &Path, input: PathBuf) -> GenerateOptions {
        GenerateOptions {
            input,
            mapping_output: dir.join("out").join("mapping.json"),
            reduced_output: dir.join("out").join("reduced.json"),
            policy: MappingPolicy::AscendingHash,
            fetch_command: None,
        }
    }

    #[test]
    fn test_generate_writes_artifacts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = write_dataset(temp_dir.path());
        let options = options(temp_dir.path(), input.clone());

        let report = generate(&options).unwrap();
        assert_eq!(report.weapons, 1);
        assert_eq!(report.mappings, 1);
        assert!(report.compressed.is_some());

        let mapping = fs::read_to_string(&options.mapping_output).unwrap();
        assert_eq!(mapping, "{\n  \"100\": \"200\"\n}");

        let reduced: Value =
            serde_json::from_str(&fs::read_to_string(&options.reduced_output).unwrap()).unwrap();
        let keys: Vec<_> = reduced.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["PerkStats", "TraitStats", "MWStats", "ReviewSummary"]);
        assert_eq!(reduced["MWStats"], json!({}));

        assert!(rollrank::compressed_path(&input).exists());
    }

    #[test]
    fn test_generate_survives_compression_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = write_dataset(temp_dir.path());
        // A directory in the way makes the compressed write fail
        fs::create_dir(rollrank::compressed_path(&input)).unwrap();
        let options = options(temp_dir.path(), input);

        let report = generate(&options).unwrap();
        assert!(report.compressed.is_none());
        assert!(options.mapping_output.is_file());
        assert!(options.reduced_output.is_file());
        assert!(report.reduced_size > 0);
    }

    #[test]
    fn test_generate_missing_input() {
        let temp_dir = tempfile::tempdir().unwrap();
        let options = options(temp_dir.path(), temp_dir.path().join("missing.json"));

        let err = generate(&options).unwrap_err();
        assert!(err.to_string().contains("Input file not found"));
        assert!(!options.mapping_output.exists());
        assert!(!options.reduced_output.exists());
    }

    #[test]
    fn test_mapping_first_seen_policy() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = write_dataset(temp_dir.path());
        let output = temp_dir.path().join("mapping.json");

        mapping(&input, &output, MappingPolicy::FirstSeenEnhanced).unwrap();

        let loaded = StandardToEnhancedMap::load(&output).unwrap();
        assert_eq!(loaded.enhanced_for(100), Some(200));
    }

    #[test]
    fn test_refresh_empty_command() {
        assert!(refresh(&[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_refresh_exit_status() {
        assert!(refresh(&["true".to_string()]).is_ok());
        assert!(refresh(&["false".to_string()]).is_err());
        assert!(refresh(&["/nonexistent/fetch-data".to_string()]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_generate_stops_on_failed_fetch() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = write_dataset(temp_dir.path());
        let mut options = options(temp_dir.path(), input);
        options.fetch_command = Some(vec!["false".to_string()]);

        assert!(generate(&options).is_err());
        assert!(!options.mapping_output.exists());
    }
}
