use burn::{
    nn::{
        loss::BinaryCrossEntropyLossConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
    tensor::TensorData,
};
use serde::{Deserialize, Serialize};

use crate::domain::{
    error::{ClassifierError, ClassifierResult},
    sequence::ALPHABET_SIZE,
};

/// Nonlinearity turning logits into scores. Only applied when
/// interpreting predictions, never inside `forward`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Sigmoid,
    Identity,
}

impl Activation {
    pub fn apply<B: Backend, const D: usize>(self, logits: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Self::Sigmoid => burn::tensor::activation::sigmoid(logits),
            Self::Identity => logits,
        }
    }
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct SequenceModelConfig {
    /// K — width of the output layer
    pub num_labels: usize,
    #[config(default = 4)]
    pub input_size: usize,
    #[config(default = 128)]
    pub hidden_size: usize,
    #[config(default = "Activation::Sigmoid")]
    pub activation: Activation,
}

impl SequenceModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SequenceModel<B> {
        let lstm = LstmConfig::new(self.input_size, self.hidden_size, true).init(device);
        let head = LinearConfig::new(self.hidden_size, self.num_labels).init(device);
        SequenceModel { lstm, head }
    }
}

#[derive(Module, Debug)]
pub struct SequenceModel<B: Backend> {
    pub lstm: Lstm<B>,
    pub head: Linear<B>,
}

pub struct SequenceModelOutput<B: Backend> {
    /// Raw scores — shape: [batch, 1, num_labels]
    pub logits: Tensor<B, 3>,
    /// Hidden state at each sample's last real timestep — shape: [batch, hidden]
    pub hidden: Tensor<B, 2>,
}

impl<B: Backend> SequenceModel<B> {
    /// inputs: [batch, max_len, 4], lengths: one per row → logits [batch, 1, K]
    pub fn forward(
        &self,
        inputs:  Tensor<B, 3>,
        lengths: &[usize],
    ) -> ClassifierResult<SequenceModelOutput<B>> {
        let [batch_size, max_len, channels] = inputs.dims();
        check_lengths(batch_size, max_len, channels, lengths)?;

        // [batch, max_len, hidden]
        let (states, _) = self.lstm.forward(inputs, None);
        let [_, _, hidden_size] = states.dims();

        // The LSTM runs left to right, so the state at t = len - 1 has seen
        // exactly the real symbols of that sample and none of its padding.
        let last_steps: Vec<i64> = lengths
            .iter()
            .flat_map(|&len| std::iter::repeat((len - 1) as i64).take(hidden_size))
            .collect();
        let index = Tensor::<B, 3, Int>::from_data(
            TensorData::new(last_steps, [batch_size, 1, hidden_size]),
            &states.device(),
        );
        let last = states.gather(1, index); // [batch, 1, hidden]

        let logits = self.head.forward(last.clone());
        let hidden = last.reshape([batch_size, hidden_size]);

        Ok(SequenceModelOutput { logits, hidden })
    }

    /// Forward pass plus mean binary cross-entropy on raw logits.
    pub fn forward_loss(
        &self,
        inputs:  Tensor<B, 3>,
        lengths: &[usize],
        labels:  Tensor<B, 3, Int>,
    ) -> ClassifierResult<(Tensor<B, 1>, SequenceModelOutput<B>)> {
        let output = self.forward(inputs, lengths)?;
        check_same_dims(&output.logits.dims(), &labels.dims())?;

        let bce = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&output.logits.device());
        let loss = bce.forward(output.logits.clone(), labels);
        Ok((loss, output))
    }
}

fn check_lengths(
    batch_size: usize,
    max_len:    usize,
    channels:   usize,
    lengths:    &[usize],
) -> ClassifierResult<()> {
    if channels != ALPHABET_SIZE {
        return Err(ClassifierError::shape_mismatch(
            format!("{ALPHABET_SIZE} input channels"),
            format!("{channels}"),
        ));
    }
    if lengths.len() != batch_size {
        return Err(ClassifierError::shape_mismatch(
            format!("{batch_size} lengths"),
            format!("{}", lengths.len()),
        ));
    }
    if let Some(&bad) = lengths.iter().find(|&&l| l == 0 || l > max_len) {
        return Err(ClassifierError::shape_mismatch(
            format!("lengths in 1..={max_len}"),
            format!("{bad}"),
        ));
    }
    Ok(())
}

/// Logits and labels must agree on every dimension.
pub fn check_same_dims<const D: usize>(logits: &[usize; D], labels: &[usize; D]) -> ClassifierResult<()> {
    if logits != labels {
        return Err(ClassifierError::shape_mismatch(
            format!("labels {labels:?}"),
            format!("logits {logits:?}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{batcher::collate, batcher::SequenceBatch, fixtures::sample};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn model(k: usize) -> SequenceModel<TestBackend> {
        TestBackend::seed(7);
        SequenceModelConfig::new(k)
            .with_hidden_size(16)
            .init(&Default::default())
    }

    fn logits_of(model: &SequenceModel<TestBackend>, seqs: &[&str], k: usize) -> Vec<f32> {
        let items: Vec<_> = seqs.iter().map(|s| sample(s, &vec![0.0; k])).collect();
        let batch = SequenceBatch::<TestBackend>::from_collated(collate(&items), &Default::default());
        model
            .forward(batch.inputs, &batch.lengths)
            .unwrap()
            .logits
            .into_data()
            .to_vec::<f32>()
            .unwrap()
    }

    #[test]
    fn test_output_shapes() {
        let m     = model(30);
        let items = vec![sample("ACG", &[0.0; 30]), sample("ACGUACG", &[0.0; 30])];
        let batch = SequenceBatch::<TestBackend>::from_collated(collate(&items), &Default::default());
        let out   = m.forward(batch.inputs, &batch.lengths).unwrap();
        assert_eq!(out.logits.dims(), [2, 1, 30]);
        assert_eq!(out.hidden.dims(), [2, 16]);
    }

    #[test]
    fn test_padding_does_not_leak() {
        let m = model(3);
        // Alone, "ACG" is never padded; next to a length-9 sequence it gets 6 pad rows
        let alone  = logits_of(&m, &["ACG"], 3);
        let padded = logits_of(&m, &["ACG", "UUUUUUUUU"], 3);
        for (a, b) in alone.iter().zip(&padded[..3]) {
            assert!((a - b).abs() < 1e-5, "{a} vs {b}");
        }
    }

    #[test]
    fn test_single_step_sequence() {
        let m = model(1);
        assert_eq!(logits_of(&m, &["A"], 1).len(), 1);
    }

    #[test]
    fn test_bad_lengths_rejected() {
        let m      = model(1);
        let inputs = Tensor::<TestBackend, 3>::zeros([2, 4, 4], &Default::default());
        assert!(matches!(
            m.forward(inputs.clone(), &[4]),
            Err(ClassifierError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            m.forward(inputs.clone(), &[4, 5]),
            Err(ClassifierError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            m.forward(inputs, &[0, 2]),
            Err(ClassifierError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_loss_rejects_label_width_mismatch() {
        let m     = model(30);
        let items = vec![sample("ACGU", &[1.0])];
        let batch = SequenceBatch::<TestBackend>::from_collated(collate(&items), &Default::default());
        let err   = m.forward_loss(batch.inputs, &batch.lengths, batch.labels).err();
        assert!(matches!(err, Some(ClassifierError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_sigmoid_activation_range() {
        let logits = Tensor::<TestBackend, 1>::from_floats([-10.0, 0.0, 10.0], &Default::default());
        let probs  = Activation::Sigmoid.apply(logits).into_data().to_vec::<f32>().unwrap();
        assert!(probs[0] < 0.01);
        assert!((probs[1] - 0.5).abs() < 1e-6);
        assert!(probs[2] > 0.99);
    }
}
