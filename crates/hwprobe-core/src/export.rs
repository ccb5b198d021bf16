//! Writing result sets to disk for external analysis, and reading them back.

use crate::error::Error;
use crate::harness::ResultSet;
use hwprobe_util::fs::atomic_write;
use std::fmt::Write as _;
use std::path::Path;

/// On-disk format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// `.csv` or `.json` (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            _ => Err(Error::Export {
                path: path.to_path_buf(),
                reason: "unsupported extension (expected .csv or .json)".into(),
            }),
        }
    }
}

/// Write `results` in the format implied by `path`'s extension.
pub fn export(results: &ResultSet, path: &Path) -> Result<ExportFormat, Error> {
    let format = ExportFormat::from_path(path)?;
    match format {
        ExportFormat::Csv => write_csv(results, path)?,
        ExportFormat::Json => write_json(results, path)?,
    }
    Ok(format)
}

/// One row per trial: `trial,weight,duration_secs`.
pub fn write_csv(results: &ResultSet, path: &Path) -> Result<(), Error> {
    let mut out = String::with_capacity(32 * (results.len() + 1));
    out.push_str("trial,weight,duration_secs\n");
    for (trial, record) in results.records().enumerate() {
        let _ = writeln!(
            out,
            "{trial},{},{:.9}",
            record.weight,
            record.duration.as_secs_f64()
        );
    }
    atomic_write(path, out.as_bytes()).map_err(|e| export_error(path, &e))
}

pub fn write_json(results: &ResultSet, path: &Path) -> Result<(), Error> {
    let json = serde_json::to_vec_pretty(results).map_err(|e| export_error(path, &e))?;
    atomic_write(path, &json).map_err(|e| export_error(path, &e))
}

/// Read a result set previously written by [`write_json`].
pub fn read_json(path: &Path) -> Result<ResultSet, Error> {
    let bytes = std::fs::read(path).map_err(|e| export_error(path, &e))?;
    let results: ResultSet = serde_json::from_slice(&bytes).map_err(|e| export_error(path, &e))?;
    if results.weights().len() != results.durations().len() {
        return Err(Error::Export {
            path: path.to_path_buf(),
            reason: format!(
                "{} weights but {} durations",
                results.weights().len(),
                results.durations().len()
            ),
        });
    }
    Ok(results)
}

fn export_error(path: &Path, err: &dyn std::fmt::Display) -> Error {
    Error::Export {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
