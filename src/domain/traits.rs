// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The dataset and the training loop depend on these capabilities
// rather than on concrete files or loggers, so both can run in
// tests without touching the filesystem.
//
// SampleSource implementations:
//   - CsvSampleLoader (data/loader.rs) → labelled CSV table
//
// MetricSink implementations:
//   - MetricsLogger (infra/metrics.rs) → appends to metrics.csv
//   - Vec<MetricPoint>                 → in-memory, used by tests
//                                        and by callers that only
//                                        want the numbers back

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::{error::ClassifierResult, sample::LabeledTable};

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Anything that can produce labelled samples for a K-label run.
///
/// Implementations:
///   - CsvSampleLoader → reads a CSV table from disk
pub trait SampleSource {
    /// Load every row. `num_labels` is the K the caller expects;
    /// a table that cannot supply it fails with a schema error.
    fn load_table(&self, num_labels: usize) -> ClassifierResult<LabeledTable>;
}

/// A single scalar observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub name:  String,
    pub value: f64,
    pub step:  usize,
}

// ─── MetricSink ───────────────────────────────────────────────────────────────
/// Passive receiver of (name, value, step) triples.
///
/// Callers treat errors as non-fatal: a failing sink is logged
/// and training continues.
pub trait MetricSink {
    fn record(&mut self, name: &str, value: f64, step: usize) -> Result<()>;
}

impl MetricSink for Vec<MetricPoint> {
    fn record(&mut self, name: &str, value: f64, step: usize) -> Result<()> {
        self.push(MetricPoint {
            name: name.to_string(),
            value,
            step,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_keeps_order() {
        let mut sink: Vec<MetricPoint> = Vec::new();
        sink.record("train_loss", 0.7, 1).unwrap();
        sink.record("validation_loss", 0.9, 1).unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].name, "validation_loss");
        assert_eq!(sink[1].step, 1);
    }
}
