// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// File-backed MetricSink: every (name, value, step) triple the
// training loop emits becomes one CSV row.
//
// Output file: <checkpoint_dir>/metrics.csv
//
// Example CSV output:
//   step,name,value
//   1,train_loss,0.693512
//   1,train_f1,0.412000
//   1,validation_loss,0.690118
//   1,validation_f1,0.455000
//   2,train_loss,0.688240
//   ...
//
// The file is appended to, so several runs into the same
// directory form one log.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::traits::MetricSink;

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "step,name,value")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl MetricSink for MetricsLogger {
    fn record(&mut self, name: &str, value: f64, step: usize) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{step},{name},{value:.6}")?;
        tracing::debug!("Logged {}={:.4} at step {}", name, value, step);
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_rows_after_header() {
        let dir        = tempfile::tempdir().unwrap();
        let mut logger = MetricsLogger::new(dir.path()).unwrap();
        logger.record("train_loss", 0.5, 1).unwrap();
        logger.record("validation_loss", 0.25, 1).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows, vec!["step,name,value", "1,train_loss,0.500000", "1,validation_loss,0.250000"]);
    }

    #[test]
    fn test_reopening_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        MetricsLogger::new(dir.path()).unwrap().record("train_f1", 1.0, 1).unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        let text   = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
