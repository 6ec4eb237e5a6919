// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Runs the restored best model without autodiff:
//   - evaluate(): accuracy + weighted F1 over a test dataset
//   - predict():  per-protein probabilities for one sequence
//
// Probabilities come from the configured activation applied to
// the raw logits here, once; the model itself only returns logits.

use anyhow::{Context, Result};
use burn::{data::dataloader::DataLoaderBuilder, prelude::*};

use crate::data::{
    batcher::{collate, SequenceBatch, SequenceBatcher},
    dataset::LabeledDataset,
};
use crate::domain::{
    error::ClassifierError,
    sample::{LabelVector, Sample},
    sequence::encode,
};
use crate::infra::checkpoint::{CheckpointManager, CheckpointMeta};
use crate::ml::evaluation::HostBatch;
use crate::ml::model::SequenceModel;

pub type InferBackend = burn::backend::NdArray;

/// Test-time scores, each averaged over batches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestReport {
    pub accuracy:    f64,
    pub weighted_f1: f64,
    pub samples:     usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// (protein, probability) in label-column order
    pub probabilities: Vec<(String, f32)>,
    /// Proteins whose probability reaches the threshold
    pub bound:         Vec<String>,
}

pub struct Inferencer {
    model:  SequenceModel<InferBackend>,
    meta:   CheckpointMeta,
    device: <InferBackend as Backend>::Device,
}

impl Inferencer {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device        = Default::default();
        let (model, meta) = ckpt_manager.restore::<InferBackend>(&device)?;
        tracing::info!(
            "Model loaded from '{}' ({} labels)",
            ckpt_manager.dir().display(),
            meta.model.num_labels
        );
        Ok(Self { model, meta, device })
    }

    pub fn new(model: SequenceModel<InferBackend>, meta: CheckpointMeta) -> Self {
        Self { model, meta, device: Default::default() }
    }

    pub fn num_labels(&self) -> usize {
        self.meta.model.num_labels
    }

    /// Accuracy and weighted F1 over every batch of `dataset`.
    pub fn evaluate(&self, dataset: LabeledDataset, batch_size: usize) -> Result<TestReport> {
        if dataset.num_labels() != self.num_labels() {
            return Err(ClassifierError::shape_mismatch(
                format!("{} labels (model output width)", self.num_labels()),
                format!("{} labels in test data", dataset.num_labels()),
            )
            .into());
        }
        anyhow::ensure!(dataset.size() > 0, "test dataset is empty");

        let samples = dataset.size();
        let loader  = DataLoaderBuilder::new(SequenceBatcher::<InferBackend>::new(self.device.clone()))
            .batch_size(batch_size)
            .build(dataset);

        let mut accuracy_sum = 0.0;
        let mut f1_sum       = 0.0;
        let mut batches      = 0usize;

        for batch in loader.iter() {
            let output = self
                .model
                .forward(batch.inputs, &batch.lengths)
                .context("test batch")?;
            let host = HostBatch::from_tensors(output.logits, batch.labels)?;
            accuracy_sum += host.accuracy()?;
            f1_sum       += host.weighted_f1()?;
            batches      += 1;
        }

        let batches = batches.max(1) as f64;
        Ok(TestReport {
            accuracy:    accuracy_sum / batches,
            weighted_f1: f1_sum / batches,
            samples,
        })
    }

    /// Score one raw sequence; proteins at or above `threshold` are reported as bound.
    pub fn predict(&self, sequence: &str, threshold: f32) -> Result<Prediction> {
        let encoded = encode(sequence.trim());
        if encoded.is_empty() {
            return Err(ClassifierError::InvalidRow {
                row:    0,
                reason: "empty sequence".to_string(),
            }
            .into());
        }

        let sample = Sample::new(encoded, LabelVector::new(vec![0.0; self.num_labels()]));
        let batch  = SequenceBatch::<InferBackend>::from_collated(collate(&[sample]), &self.device);
        let output = self.model.forward(batch.inputs, &batch.lengths)?;

        let probs = self
            .meta
            .model
            .activation
            .apply(output.logits)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ClassifierError::Tensor(format!("{e:?}")))?;

        let probabilities: Vec<(String, f32)> = self
            .meta
            .label_names
            .iter()
            .cloned()
            .zip(probs)
            .collect();
        let bound = probabilities
            .iter()
            .filter(|(_, p)| *p >= threshold)
            .map(|(name, _)| name.clone())
            .collect();

        tracing::debug!("Predicted {:?} for sequence of length {}", probabilities, sequence.len());
        Ok(Prediction { probabilities, bound })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::dataset;
    use crate::ml::model::SequenceModelConfig;

    fn inferencer(k: usize) -> Inferencer {
        let config = SequenceModelConfig::new(k).with_hidden_size(8);
        let model  = config.init::<InferBackend>(&Default::default());
        Inferencer::new(model, CheckpointMeta {
            model:       config,
            label_names: (0..k).map(|j| format!("RBP{j}")).collect(),
        })
    }

    #[test]
    fn test_evaluate_reports_bounded_scores() {
        let report = inferencer(3).evaluate(dataset(10, 3), 4).unwrap();
        assert_eq!(report.samples, 10);
        assert!((0.0..=1.0).contains(&report.accuracy));
        assert!((0.0..=1.0).contains(&report.weighted_f1));
    }

    #[test]
    fn test_evaluate_rejects_label_width_mismatch() {
        let err = inferencer(30).evaluate(dataset(4, 1), 4).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClassifierError>(),
            Some(ClassifierError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_predict_names_every_label() {
        let p = inferencer(2).predict("ACGUACGUNN", 0.0).unwrap();
        assert_eq!(p.probabilities.len(), 2);
        assert_eq!(p.probabilities[0].0, "RBP0");
        assert!(p.probabilities.iter().all(|(_, v)| (0.0..=1.0).contains(v)));
        // threshold 0 → every protein counts as bound
        assert_eq!(p.bound, vec!["RBP0".to_string(), "RBP1".to_string()]);

        let none = inferencer(2).predict("ACGU", 1.1).unwrap();
        assert!(none.bound.is_empty());
    }

    #[test]
    fn test_predict_rejects_empty_sequence() {
        assert!(inferencer(1).predict("   ", 0.5).is_err());
    }
}
