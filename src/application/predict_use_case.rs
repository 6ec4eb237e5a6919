// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Restores the best checkpoint written by `train` and scores a
// single raw RNA sequence against every protein the model was
// trained on.
//
//   Step 1: Rebuild model from meta + weights (Layer 6 - infra)
//   Step 2: Encode and score the sequence     (Layer 5 - ml)

use anyhow::Result;

use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::{Inferencer, Prediction};

/// Probability at or above which a protein is reported as bound.
pub const DEFAULT_THRESHOLD: f32 = 0.52;

pub struct PredictUseCase {
    inferencer: Inferencer,
}

impl PredictUseCase {
    pub fn new(checkpoint_dir: impl Into<String>) -> Result<Self> {
        let ckpt_manager = CheckpointManager::new(checkpoint_dir);
        let inferencer   = Inferencer::from_checkpoint(&ckpt_manager)?;
        Ok(Self { inferencer })
    }

    pub fn predict(&self, sequence: &str, threshold: f32) -> Result<Prediction> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&threshold),
            "threshold must be in [0, 1], got {threshold}"
        );
        self.inferencer.predict(sequence, threshold)
    }
}
