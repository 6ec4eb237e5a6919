use burn::data::dataset::Dataset;

use crate::data::splitter::split_train_val;
use crate::domain::{
    error::{ClassifierError, ClassifierResult},
    sample::{LabeledTable, Sample},
    traits::SampleSource,
};

/// Fixed-order collection of samples sharing one label width K.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    samples:     Vec<Sample>,
    num_labels:  usize,
    label_names: Vec<String>,
}

impl LabeledDataset {
    /// Build a dataset, checking that every sample carries exactly `num_labels` labels.
    pub fn new(table: LabeledTable, num_labels: usize) -> ClassifierResult<Self> {
        if num_labels == 0 {
            return Err(ClassifierError::InvalidConfig("label count must be at least 1".into()));
        }
        if table.label_names.len() != num_labels {
            return Err(ClassifierError::Schema {
                expected: num_labels,
                found:    table.label_names.len(),
                detail:   "label column names".to_string(),
            });
        }
        if let Some((row, s)) = table
            .samples
            .iter()
            .enumerate()
            .find(|(_, s)| s.labels().width() != num_labels)
        {
            return Err(ClassifierError::Schema {
                expected: num_labels,
                found:    s.labels().width(),
                detail:   format!("row {row}"),
            });
        }
        if let Some(row) = table.samples.iter().position(Sample::is_empty) {
            return Err(ClassifierError::InvalidRow {
                row,
                reason: "empty sequence".to_string(),
            });
        }

        Ok(Self {
            samples: table.samples,
            num_labels,
            label_names: table.label_names,
        })
    }

    /// Load from any sample source and validate against K.
    pub fn from_source(source: &impl SampleSource, num_labels: usize) -> ClassifierResult<Self> {
        Self::new(source.load_table(num_labels)?, num_labels)
    }

    pub fn size(&self) -> usize {
        self.samples.len()
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Indexed access; `index >= size()` is an OutOfRange error.
    pub fn sample(&self, index: usize) -> ClassifierResult<&Sample> {
        self.samples.get(index).ok_or(ClassifierError::OutOfRange {
            index,
            len: self.samples.len(),
        })
    }

    /// Seeded split into (train, validation). Same seed and fraction, same partition.
    pub fn split(&self, val_fraction: f64, seed: u64) -> ClassifierResult<(Self, Self)> {
        if self.samples.len() < 2 {
            return Err(ClassifierError::InvalidConfig(format!(
                "need at least 2 samples to split, got {}",
                self.samples.len()
            )));
        }
        if !(val_fraction > 0.0 && val_fraction < 1.0) {
            return Err(ClassifierError::InvalidConfig(format!(
                "validation fraction must be in (0, 1), got {val_fraction}"
            )));
        }

        let (train, val) = split_train_val(self.samples.clone(), val_fraction, seed);
        if train.is_empty() {
            return Err(ClassifierError::InvalidConfig(format!(
                "validation fraction {val_fraction} leaves no training samples"
            )));
        }

        Ok((self.with_samples(train), self.with_samples(val)))
    }

    fn with_samples(&self, samples: Vec<Sample>) -> Self {
        Self {
            samples,
            num_labels:  self.num_labels,
            label_names: self.label_names.clone(),
        }
    }
}

impl Dataset<Sample> for LabeledDataset {
    fn get(&self, index: usize) -> Option<Sample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
