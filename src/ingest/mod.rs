//! CSV ingestion: column mapping, parsing, cleaning and bulk replacement of
//! the persisted measurements.

pub mod clean;
pub mod reader;
pub mod schema;

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::Context;
use chrono::NaiveDateTime;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::IngestConfig, domain::Measurement, repo::MeasurementStore};

pub use clean::{clean, CleanOptions};
pub use reader::{read_rows, RawRow};

/// Strategy for repairing zero or missing channel values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapFill {
    /// Uniform draw from the channel's valid range.
    #[default]
    Random,
    /// Mean of the channel's non-zero values in the same file.
    Mean,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot read {source_name}: {source}")]
    Io {
        source_name: String,
        source: std::io::Error,
    },

    #[error("malformed CSV in {source_name}: {source}")]
    Csv {
        source_name: String,
        source: csv::Error,
    },

    #[error("{source_name}: missing required columns {columns:?}")]
    MissingColumns {
        source_name: String,
        columns: Vec<&'static str>,
    },

    #[error("{source_name} line {line}: invalid timestamp {value:?}")]
    Timestamp {
        source_name: String,
        line: u64,
        value: String,
    },

    #[error("{source_name} line {line}: column {column} is not a number: {value:?}: {source}")]
    Number {
        source_name: String,
        line: u64,
        column: &'static str,
        value: String,
        source: std::num::ParseFloatError,
    },

    #[error("delimiter {0:?} is not a single-byte ASCII character")]
    Delimiter(char),

    #[error("{source_name}: {timestamp} has no equivalent in year {year}")]
    YearRewrite {
        source_name: String,
        timestamp: NaiveDateTime,
        year: i32,
    },
}

/// Outcome of a successful import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub files: usize,
    pub rows_read: usize,
    pub rows_persisted: usize,
}

/// Random source for gap repair, reproducible when a seed is configured.
pub fn gap_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Read and clean one delimited source.
///
/// Returns the cleaned rows together with the number of raw data rows read.
pub fn prepare_reader<R: Read>(
    reader: R,
    source_name: &str,
    cfg: &IngestConfig,
    rng: &mut impl Rng,
) -> Result<(Vec<Measurement>, usize), IngestError> {
    let raw = read_rows(reader, source_name, delimiter_byte(cfg.delimiter)?)?;
    let read = raw.len();
    let cleaned = clean(raw, source_name, &CleanOptions::from(cfg), rng)?;
    Ok((cleaned, read))
}

pub fn prepare_file(
    path: &Path,
    cfg: &IngestConfig,
    rng: &mut impl Rng,
) -> Result<(Vec<Measurement>, usize), IngestError> {
    let source_name = path.display().to_string();
    let file = File::open(path).map_err(|source| IngestError::Io {
        source_name: source_name.clone(),
        source,
    })?;
    prepare_reader(file, &source_name, cfg, rng)
}

/// Clean every file before touching the store, then replace the persisted
/// dataset in a single call. Any failure leaves the store untouched.
pub async fn import_files(
    store: &dyn MeasurementStore,
    paths: &[PathBuf],
    cfg: &IngestConfig,
) -> anyhow::Result<ImportSummary> {
    let started = Instant::now();
    let mut rng = gap_rng(cfg.seed);
    let mut rows: Vec<Measurement> = Vec::new();
    let mut rows_read = 0;

    for path in paths {
        tracing::info!(file = %path.display(), "Preparing file");
        let (cleaned, read) = match prepare_file(path, cfg, &mut rng) {
            Ok(out) => out,
            Err(e) => {
                metrics::counter!("microgrid_ingest_failures_total", 1);
                tracing::error!(file = %path.display(), error = %e, "Import aborted");
                return Err(e.into());
            }
        };
        metrics::counter!("microgrid_ingest_rows_read_total", read as u64);
        tracing::info!(
            file = %path.display(),
            rows_read = read,
            rows_cleaned = cleaned.len(),
            "File cleaned"
        );
        rows_read += read;
        rows.extend(cleaned);
    }

    let rows_persisted = rows.len();
    store
        .replace_all(rows)
        .await
        .context("failed to replace stored measurements")?;

    metrics::counter!("microgrid_ingest_rows_persisted_total", rows_persisted as u64);
    metrics::histogram!(
        "microgrid_ingest_duration_seconds",
        started.elapsed().as_secs_f64()
    );
    tracing::info!(files = paths.len(), rows_persisted, "Import finished");

    Ok(ImportSummary {
        files: paths.len(),
        rows_read,
        rows_persisted,
    })
}

fn delimiter_byte(delimiter: char) -> Result<u8, IngestError> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(IngestError::Delimiter(delimiter))
}
