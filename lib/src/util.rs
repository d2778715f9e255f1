use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use log::info;

/// Arithmetic mean. Returns NaN on an empty slice, matching the behavior of
/// the fold it wraps.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// 50th percentile. For an even number of samples the two middle values are
/// averaged.
pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}

/// Creates the output directory if needed and returns the path of the file
/// `<dir>/<file_name>.<extension>`.
pub fn create_output_path(dir_path: &str, file_name: &str, extension: &str) -> Result<PathBuf> {
    if fs::metadata(dir_path).is_err() {
        fs::create_dir_all(dir_path)?;
        info!("Created folder: {}", dir_path);
    }
    Ok(Path::new(dir_path).join(format!("{}.{}", file_name, extension)))
}
