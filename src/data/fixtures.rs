// Shared test fixtures for the data and ml layers.

use crate::data::dataset::LabeledDataset;
use crate::domain::{
    sample::{LabelVector, LabeledTable, Sample},
    sequence::encode,
};

/// `n` samples with lengths cycling 4, 8, 12 and alternating labels.
pub fn table(n: usize, k: usize) -> LabeledTable {
    let samples = (0..n)
        .map(|i| {
            let seq    = "ACGU".repeat(i % 3 + 1);
            let labels = (0..k).map(|j| ((i + j) % 2) as f32).collect();
            Sample::new(encode(&seq), LabelVector::new(labels))
        })
        .collect();
    LabeledTable {
        label_names: (0..k).map(|j| format!("RBP{j}")).collect(),
        samples,
    }
}

pub fn dataset(n: usize, k: usize) -> LabeledDataset {
    LabeledDataset::new(table(n, k), k).expect("fixture table is well-formed")
}

pub fn sample(seq: &str, labels: &[f32]) -> Sample {
    Sample::new(encode(seq), LabelVector::new(labels.to_vec()))
}
