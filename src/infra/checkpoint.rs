// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the best model weights with a Burn
// file recorder (MessagePack, full precision, so a reload
// reproduces predictions bit for bit).
//
// Files in the checkpoint directory:
//   best_model.mpk    ← weights of the best epoch so far,
//                       overwritten whenever validation loss
//                       strictly improves
//   best_epoch.json   ← which epoch those weights came from
//   model_meta.json   ← model config + protein names, needed
//                       to rebuild the model before loading
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::ml::model::{SequenceModel, SequenceModelConfig};

const BEST_MODEL: &str = "best_model";
const BEST_EPOCH: &str = "best_epoch.json";
const MODEL_META: &str = "model_meta.json";

type WeightsRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Everything needed to rebuild the model without the training data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub model:       SequenceModelConfig,
    /// Protein names in label-column order
    pub label_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the weights file, extension included.
    pub fn best_model_path(&self) -> PathBuf {
        self.dir.join(BEST_MODEL).with_extension("mpk")
    }

    pub fn has_best(&self) -> bool {
        self.best_model_path().exists()
    }

    /// Overwrite the best checkpoint with `model`'s weights.
    pub fn save_best<B: Backend>(&self, model: &SequenceModel<B>, epoch: usize) -> Result<()> {
        // The recorder appends the extension itself
        let path = self.dir.join(BEST_MODEL);

        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let epoch_path = self.dir.join(BEST_EPOCH);
        fs::write(&epoch_path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", epoch_path.display()))?;

        tracing::debug!("Saved best checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Remove weights left by an earlier run in the same directory.
    pub fn clear_best(&self) -> Result<()> {
        for path in [self.best_model_path(), self.dir.join(BEST_EPOCH)] {
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("Cannot remove stale '{}'", path.display()))?;
                tracing::debug!("Removed stale checkpoint file '{}'", path.display());
            }
        }
        Ok(())
    }

    /// Load the best weights into `model` (which must have the saved architecture).
    pub fn load_best<B: Backend>(
        &self,
        model:  SequenceModel<B>,
        device: &B::Device,
    ) -> Result<SequenceModel<B>> {
        let path = self.dir.join(BEST_MODEL);

        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        if let Ok(epoch) = self.best_epoch() {
            tracing::info!("Loaded best checkpoint from epoch {}", epoch);
        }
        Ok(model.load_record(record))
    }

    /// Rebuild a model from the saved metadata and load the best weights.
    pub fn restore<B: Backend>(&self, device: &B::Device) -> Result<(SequenceModel<B>, CheckpointMeta)> {
        let meta  = self.load_meta()?;
        let model = self.load_best(meta.model.init(device), device)?;
        Ok((model, meta))
    }

    pub fn save_meta(&self, meta: &CheckpointMeta) -> Result<()> {
        let path = self.dir.join(MODEL_META);
        let json = serde_json::to_string_pretty(meta)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write model metadata to '{}'", path.display()))?;
        tracing::debug!("Saved model metadata to '{}'", path.display());
        Ok(())
    }

    pub fn load_meta(&self) -> Result<CheckpointMeta> {
        let path = self.dir.join(MODEL_META);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read model metadata from '{}'. Make sure you have run 'train' first.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Epoch of the weights in `best_model.mpk`.
    pub fn best_epoch(&self) -> Result<usize> {
        let path = self.dir.join(BEST_EPOCH);
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{batcher::{collate, SequenceBatch}, fixtures::sample};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn predict(model: &SequenceModel<TestBackend>) -> Vec<f32> {
        let items = vec![
            sample("ACGUAGGC", &[1.0, 0.0]),
            sample("GGA", &[0.0, 1.0]),
            sample("UUACN", &[1.0, 1.0]),
        ];
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
    fn test_save_then_load_is_bit_identical() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path().to_str().unwrap());
        let device = Default::default();
        let config = SequenceModelConfig::new(2).with_hidden_size(8);

        TestBackend::seed(11);
        let trained: SequenceModel<TestBackend> = config.init(&device);
        let before = predict(&trained);
        ckpt.save_best(&trained, 3).unwrap();

        // A differently initialised model picks up the saved weights
        TestBackend::seed(99);
        let fresh: SequenceModel<TestBackend> = config.init(&device);
        let loaded = ckpt.load_best(fresh, &device).unwrap();
        let after  = predict(&loaded);

        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(&after) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        assert_eq!(ckpt.best_epoch().unwrap(), 3);
    }

    #[test]
    fn test_save_overwrites_in_place() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().to_str().unwrap());
        let m: SequenceModel<TestBackend> = SequenceModelConfig::new(1)
            .with_hidden_size(4)
            .init(&Default::default());

        ckpt.save_best(&m, 1).unwrap();
        ckpt.save_best(&m, 4).unwrap();

        assert!(ckpt.has_best());
        assert_eq!(ckpt.best_epoch().unwrap(), 4);
        let files = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 2);
    }

    #[test]
    fn test_clear_best_removes_previous_weights() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().to_str().unwrap());
        let m: SequenceModel<TestBackend> = SequenceModelConfig::new(1)
            .with_hidden_size(4)
            .init(&Default::default());

        ckpt.clear_best().unwrap();
        ckpt.save_best(&m, 2).unwrap();
        ckpt.clear_best().unwrap();

        assert!(!ckpt.has_best());
        assert!(ckpt.best_epoch().is_err());
        assert!(ckpt.load_best(m, &Default::default()).is_err());
    }

    #[test]
    fn test_meta_round_trip_and_restore() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().to_str().unwrap());
        let meta = CheckpointMeta {
            model:       SequenceModelConfig::new(2).with_hidden_size(8),
            label_names: vec!["FUS".into(), "HNRNPK".into()],
        };
        ckpt.save_meta(&meta).unwrap();
        let m: SequenceModel<TestBackend> = meta.model.init(&Default::default());
        ckpt.save_best(&m, 1).unwrap();

        let (restored, loaded_meta) = ckpt.restore::<TestBackend>(&Default::default()).unwrap();
        assert_eq!(loaded_meta.label_names, meta.label_names);
        assert_eq!(loaded_meta.model.hidden_size, 8);
        assert_eq!(predict(&restored), predict(&m));
    }

    #[test]
    fn test_missing_checkpoint_is_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().to_str().unwrap());
        assert!(!ckpt.has_best());
        assert!(ckpt.load_meta().is_err());
        let m: SequenceModel<TestBackend> = SequenceModelConfig::new(1).init(&Default::default());
        assert!(ckpt.load_best(m, &Default::default()).is_err());
    }
}
