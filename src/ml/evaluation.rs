// ============================================================
// Layer 5 — Evaluation
// ============================================================
// Metrics shared by the training, validation and test phases.
//
// Weighted F1 (every phase):
//   1. sigmoid(logit) ≥ 0.5 → predicted 1, else 0
//   2. per label j over the batch: tp_j, fp_j, fn_j
//   3. f1_j = 2·tp_j / (2·tp_j + fp_j + fn_j)
//   4. weighted F1 = Σ support_j · f1_j / Σ support_j,
//      support_j = tp_j + fn_j (true occurrences of label j)
//
//   With K = 1 the single column is a binary target and both of
//   its classes are scored, the "0" class weighted by the number
//   of negatives. With K > 1 each column is scored on its
//   positives only.
//
//   A batch with no positive label anywhere (zero total support)
//   scores 1.0 when the model predicted no positives either,
//   otherwise 0.0. For K > 1 this departs from sklearn's weighted
//   F1, which reports 0.0 for an all-negative batch even when
//   nothing was predicted positive.
//
// Accuracy (test phase only):
//   round(sigmoid(logit)), ties to even, compared with every
//   label of every sample; the fraction that match. No per-label
//   weighting.

use burn::prelude::*;

use crate::domain::error::{ClassifierError, ClassifierResult};
use crate::ml::model::check_same_dims;

/// Probability at or above which a label is predicted present.
pub const THRESHOLD: f32 = 0.5;

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Threshold raw logits into 0/1 predictions.
pub fn binarize(logits: &[f32]) -> Vec<bool> {
    logits.iter().map(|&x| sigmoid(x) >= THRESHOLD).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LabelCounts {
    tp:       usize,
    fp:       usize,
    fn_count: usize,
}

impl LabelCounts {
    fn support(&self) -> usize {
        self.tp + self.fn_count
    }

    fn f1(&self) -> f64 {
        let denom = 2 * self.tp + self.fp + self.fn_count;
        if denom == 0 {
            0.0
        } else {
            (2 * self.tp) as f64 / denom as f64
        }
    }

    fn add(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.tp += 1,
            (true, false) => self.fp += 1,
            (false, true) => self.fn_count += 1,
            (false, false) => {}
        }
    }
}

/// Support-weighted F1 over a row-major B × K matrix of predictions.
pub fn weighted_f1(predictions: &[bool], labels: &[bool], num_labels: usize) -> f64 {
    debug_assert_eq!(predictions.len(), labels.len());

    let mut counts = vec![LabelCounts::default(); num_labels];
    // K = 1: second slot scores the negative class
    let mut negatives = LabelCounts::default();

    for (i, (&p, &y)) in predictions.iter().zip(labels).enumerate() {
        counts[i % num_labels].add(p, y);
        if num_labels == 1 {
            negatives.add(!p, !y);
        }
    }
    if num_labels == 1 {
        counts.push(negatives);
    }

    let total_support: usize = counts.iter().map(LabelCounts::support).sum();
    if total_support == 0 {
        let any_fp = counts.iter().any(|c| c.fp > 0);
        return if any_fp { 0.0 } else { 1.0 };
    }

    counts
        .iter()
        .map(|c| c.support() as f64 * c.f1())
        .sum::<f64>()
        / total_support as f64
}

/// Sigmoid, threshold at 0.5 and score against 0/1 labels.
/// `logits` and `labels` are the flattened B × 1 × K buffers.
pub fn threshold_and_score(logits: &[f32], labels: &[f32], num_labels: usize) -> ClassifierResult<f64> {
    check_buffers(logits, labels, num_labels)?;
    let predictions = binarize(logits);
    let labels: Vec<bool> = labels.iter().map(|&y| y >= 0.5).collect();
    Ok(weighted_f1(&predictions, &labels, num_labels))
}

/// Fraction of (sample, label) entries where round(sigmoid(logit)) equals the label.
pub fn rounded_accuracy(logits: &[f32], labels: &[f32]) -> ClassifierResult<f64> {
    if logits.len() != labels.len() {
        return Err(ClassifierError::shape_mismatch(
            format!("{} label entries", labels.len()),
            format!("{} logits", logits.len()),
        ));
    }
    if logits.is_empty() {
        return Ok(0.0);
    }
    let correct = logits
        .iter()
        .zip(labels)
        .filter(|(&x, &y)| sigmoid(x).round_ties_even() == y)
        .count();
    Ok(correct as f64 / logits.len() as f64)
}

fn check_buffers(logits: &[f32], labels: &[f32], num_labels: usize) -> ClassifierResult<()> {
    if num_labels == 0 || logits.len() != labels.len() || logits.len() % num_labels != 0 {
        return Err(ClassifierError::shape_mismatch(
            format!("{} label entries in rows of {num_labels}", labels.len()),
            format!("{} logits", logits.len()),
        ));
    }
    Ok(())
}

// ─── Tensor adapters ──────────────────────────────────────────────────────────
/// Logits and labels of one batch, copied to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostBatch {
    pub logits:     Vec<f32>,
    pub labels:     Vec<f32>,
    pub num_labels: usize,
}

impl HostBatch {
    /// `logits` and `labels` are both [batch, 1, K].
    pub fn from_tensors<B: Backend>(logits: Tensor<B, 3>, labels: Tensor<B, 3, Int>) -> ClassifierResult<Self> {
        let dims = logits.dims();
        check_same_dims(&dims, &labels.dims())?;

        let logits = logits
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ClassifierError::Tensor(format!("{e:?}")))?;
        let labels = labels
            .float()
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ClassifierError::Tensor(format!("{e:?}")))?;

        Ok(Self {
            logits,
            labels,
            num_labels: dims[2],
        })
    }

    pub fn weighted_f1(&self) -> ClassifierResult<f64> {
        threshold_and_score(&self.logits, &self.labels, self.num_labels)
    }

    pub fn accuracy(&self) -> ClassifierResult<f64> {
        rounded_accuracy(&self.logits, &self.labels)
    }
}
