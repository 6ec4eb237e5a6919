// ============================================================
// Layer 3 — Sample Domain Type
// ============================================================
// One training example: an encoded RNA sequence and its
// multi-hot label vector over the K RNA-binding proteins.
//
// Fields are private so a sample cannot change after the
// dataset has built it.

use serde::{Deserialize, Serialize};

use crate::domain::sequence::EncodedSequence;

/// Multi-hot vector of K entries, each 0.0 or 1.0.
/// Several 1s at once are valid (multi-label).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelVector(Vec<f32>);

impl LabelVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Number of labels K
    pub fn width(&self) -> usize {
        self.0.len()
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    sequence: EncodedSequence,
    labels:   LabelVector,
}

impl Sample {
    pub fn new(sequence: EncodedSequence, labels: LabelVector) -> Self {
        Self { sequence, labels }
    }

    pub fn sequence(&self) -> &EncodedSequence {
        &self.sequence
    }

    pub fn labels(&self) -> &LabelVector {
        &self.labels
    }

    /// Unpadded sequence length
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Samples plus the protein names taken from the label columns.
#[derive(Debug, Clone, Default)]
pub struct LabeledTable {
    pub label_names: Vec<String>,
    pub samples:     Vec<Sample>,
}
