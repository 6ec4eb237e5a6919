// ============================================================
// Layer 4 — Sequence Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<Sample> of
// variable-length sequences into one padded tensor batch.
//
// How batching works here:
//   Input:  B samples with lengths L_1 .. L_B
//   Output: SequenceBatch with
//             inputs  [B, L_max, 4]  zero rows appended after
//                                    each sequence's last symbol
//             labels  [B, 1, K]      one single-step prediction
//                                    target per sample
//             lengths [L_1, .., L_B] in sample order
//
//   Padding is trailing only, so timestep t of sample i is the
//   t-th symbol of that sample for every t < L_i. The model
//   reads lengths to stop at the last real symbol.
//
// Collation is split in two:
//   collate()          → plain Vec buffers, no backend needed
//   SequenceBatcher    → moves those buffers onto a device
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::domain::{sample::Sample, sequence::ALPHABET_SIZE};

// ─── CollatedBatch ────────────────────────────────────────────────────────────
/// Host-side padded batch. Buffers are row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CollatedBatch {
    /// B × L_max × 4
    pub inputs:     Vec<f32>,
    /// B × 1 × K
    pub labels:     Vec<f32>,
    /// True length of each sample, in sample order
    pub lengths:    Vec<usize>,
    pub batch_size: usize,
    pub max_len:    usize,
    pub num_labels: usize,
}

/// Pad `samples` to the longest sequence, keeping their order.
pub fn collate(samples: &[Sample]) -> CollatedBatch {
    let batch_size = samples.len();
    let max_len    = samples.iter().map(Sample::len).max().unwrap_or(0);
    let num_labels = samples.first().map_or(0, |s| s.labels().width());

    // Zero-initialised, so every slot past a sequence's end is a padding row
    let mut inputs = vec![0.0f32; batch_size * max_len * ALPHABET_SIZE];
    for (i, sample) in samples.iter().enumerate() {
        let offset = i * max_len * ALPHABET_SIZE;
        for (t, row) in sample.sequence().rows().iter().enumerate() {
            let start = offset + t * ALPHABET_SIZE;
            inputs[start..start + ALPHABET_SIZE].copy_from_slice(row);
        }
    }

    let labels: Vec<f32> = samples
        .iter()
        .flat_map(|s| s.labels().values().iter().copied())
        .collect();

    let lengths = samples.iter().map(Sample::len).collect();

    CollatedBatch {
        inputs,
        labels,
        lengths,
        batch_size,
        max_len,
        num_labels,
    }
}

// ─── SequenceBatch ────────────────────────────────────────────────────────────
/// A padded batch on a device, ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// One-hot inputs — shape: [batch_size, max_len, 4]
    pub inputs: Tensor<B, 3>,

    /// Multi-hot targets — shape: [batch_size, 1, num_labels]
    pub labels: Tensor<B, 3, Int>,

    /// Unpadded length of each sample, same order as the rows of `inputs`
    pub lengths: Vec<usize>,
}

impl<B: Backend> SequenceBatch<B> {
    pub fn from_collated(batch: CollatedBatch, device: &B::Device) -> Self {
        let CollatedBatch {
            inputs,
            labels,
            lengths,
            batch_size,
            max_len,
            num_labels,
        } = batch;

        let inputs = Tensor::<B, 3>::from_data(
            TensorData::new(inputs, [batch_size, max_len, ALPHABET_SIZE]),
            device,
        );

        let labels: Vec<i64> = labels.into_iter().map(|v| v as i64).collect();
        let labels = Tensor::<B, 3, Int>::from_data(
            TensorData::new(labels, [batch_size, 1, num_labels]),
            device,
        );

        Self { inputs, labels, lengths }
    }

    pub fn batch_size(&self) -> usize {
        self.lengths.len()
    }
}

// ─── SequenceBatcher ──────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on it.
#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<Sample, SequenceBatch<B>> for SequenceBatcher<B> {
    fn batch(&self, items: Vec<Sample>) -> SequenceBatch<B> {
        SequenceBatch::from_collated(collate(&items), &self.device)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::sample;
    use burn::backend::NdArray;

    #[test]
    fn test_pads_to_longest_and_keeps_order() {
        let items = vec![
            sample("ACG", &[1.0]),
            sample("ACGUACG", &[0.0]),
            sample("UUUUU", &[1.0]),
        ];
        let c = collate(&items);
        assert_eq!(c.batch_size, 3);
        assert_eq!(c.max_len, 7);
        assert_eq!(c.lengths, vec![3, 7, 5]);
        assert_eq!(c.inputs.len(), 3 * 7 * 4);
        assert_eq!(c.labels, vec![1.0, 0.0, 1.0]);

        // Sample 0, timestep 2 is G; timesteps 3.. are padding
        let row = |i: usize, t: usize| &c.inputs[(i * 7 + t) * 4..(i * 7 + t) * 4 + 4];
        assert_eq!(row(0, 2), &[0.0, 0.0, 1.0, 0.0]);
        for t in 3..7 {
            assert_eq!(row(0, t), &[0.0; 4]);
        }
        // Sample 2, last real timestep is U
        assert_eq!(row(2, 4), &[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(row(2, 5), &[0.0; 4]);
    }

    #[test]
    fn test_lengths_match_unpadded_rows() {
        let items = vec![sample("AC", &[1.0]), sample("ACGUA", &[0.0])];
        let c     = collate(&items);
        for (i, s) in items.iter().enumerate() {
            assert_eq!(c.lengths[i], s.len());
        }
    }

    #[test]
    fn test_single_sample_single_step() {
        let c = collate(&[sample("G", &[0.0, 1.0])]);
        assert_eq!(c.batch_size, 1);
        assert_eq!(c.max_len, 1);
        assert_eq!(c.inputs, vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(c.num_labels, 2);
    }

    #[test]
    fn test_tensor_shapes() {
        let batcher = SequenceBatcher::<NdArray>::new(Default::default());
        let batch   = batcher.batch(vec![
            sample("ACG", &[1.0, 0.0]),
            sample("ACGUACG", &[0.0, 0.0]),
            sample("UUUUU", &[1.0, 1.0]),
        ]);
        assert_eq!(batch.inputs.dims(), [3, 7, 4]);
        assert_eq!(batch.labels.dims(), [3, 1, 2]);
        assert_eq!(batch.lengths, vec![3, 7, 5]);
        assert_eq!(batch.batch_size(), 3);
    }
}
