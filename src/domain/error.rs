// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure the core can raise. None of them is retried:
// a schema or shape problem means the run is misconfigured.
//
// The data and ml layers return `ClassifierResult<T>`; the
// application and CLI layers wrap these in anyhow with context.

use thiserror::Error;

/// Result alias used by the data and ml layers.
pub type ClassifierResult<T> = Result<T, ClassifierError>;

#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The table does not carry the number of label columns requested
    #[error("schema error: expected {expected} label columns, found {found} ({detail})")]
    Schema {
        expected: usize,
        found:    usize,
        detail:   String,
    },

    /// Dataset index past the end
    #[error("index {index} out of range for dataset of {len} samples")]
    OutOfRange { index: usize, len: usize },

    /// Batch, model and label dimensions disagree
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// A single row could not be turned into a sample
    #[error("invalid row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading tensor data back to the host failed
    #[error("tensor error: {0}")]
    Tensor(String),
}

impl ClassifierError {
    pub fn shape_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            got:      got.into(),
        }
    }
}
