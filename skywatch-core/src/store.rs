//! File-based exchange with the external orchestrator: location requests
//! in, collection results out, per-location history in, analysis results
//! out. All paths come from [`crate::config::FilesConfig`].

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

use crate::model::{AnalysisResult, Location, LocationData, WeatherResult};

/// Read the JSON array of locations the orchestrator wants collected.
pub fn read_locations(path: &Path) -> Result<Vec<Location>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read locations file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse locations file: {}", path.display()))
}

/// Write collection results as a pretty-printed JSON array, creating parent
/// directories as needed.
pub fn write_results(path: &Path, results: &[WeatherResult]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json =
        serde_json::to_string_pretty(results).context("Failed to serialize weather results")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write results file: {}", path.display()))
}

/// Read every per-location history file (`*.json`) in the timeseries
/// directory, sorted by file name for deterministic processing order.
///
/// An unreadable directory is fatal; a malformed individual file is logged
/// and skipped so one bad history cannot block the other locations.
pub fn read_location_history(dir: &Path) -> Result<Vec<LocationData>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read timeseries directory: {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut histories = Vec::with_capacity(paths.len());
    for path in paths {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read history file: {}", path.display()))?;
        match serde_json::from_str::<LocationData>(&contents) {
            Ok(data) => histories.push(data),
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping malformed history file");
            }
        }
    }

    Ok(histories)
}

/// Write one analysis result into the analysis directory and return the
/// path it was written to.
pub fn write_analysis(dir: &Path, result: &AnalysisResult) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create analysis directory: {}", dir.display()))?;

    let path = dir.join(analysis_file_name(&result.location, result.generated_at));
    let json = serde_json::to_string_pretty(result).context("Failed to serialize analysis")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write analysis file: {}", path.display()))?;

    Ok(path)
}

/// `<sanitized location>_analysis_<YYYYMMDD_HHMMSS>.json`
pub fn analysis_file_name(location: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        "{}_analysis_{}.json",
        sanitize_location_name(location),
        generated_at.format("%Y%m%d_%H%M%S")
    )
}

fn sanitize_location_name(name: &str) -> String {
    name.replace(' ', "_").replace(',', "").replace('/', "_")
}
