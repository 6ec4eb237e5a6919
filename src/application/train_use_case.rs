// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate configuration        (this layer)
//   Step 2: Load + check training table   (Layer 4 - data)
//   Step 3: Load + check test table       (Layer 4 - data)
//   Step 4: Seeded train/validation split (Layer 4 - data)
//   Step 5: Clear old weights, save meta  (Layer 6 - infra)
//   Step 6: Early-stopping training loop  (Layer 5 - ml)
//   Step 7: Restore best checkpoint, test (Layer 5 - ml)
//
// Both tables are loaded before the first epoch, so a schema
// problem in either file fails the run before any training.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{dataset::LabeledDataset, loader::CsvSampleLoader};
use crate::domain::error::ClassifierError;
use crate::infra::{
    checkpoint::{CheckpointManager, CheckpointMeta},
    metrics::MetricsLogger,
};
use crate::ml::{
    early_stopping::TrainingSummary,
    inferencer::{Inferencer, TestReport},
    model::SequenceModelConfig,
    trainer::run_training,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// K (num_labels) is the single knob deciding binary (1) versus
// multi-label (30) runs; dataset, model and loop all read it here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub train_path:     String,
    pub num_labels:     usize,
    pub epochs:         usize,
    pub patience:       usize,
    pub test_path:      String,
    pub test_labels:    usize,
    pub checkpoint_dir: String,
    pub batch_size:     usize,
    pub lr:             f64,
    pub weight_decay:   f32,
    pub hidden_size:    usize,
    pub val_fraction:   f64,
    pub seed:           u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_path:     "train_dataset.csv".to_string(),
            num_labels:     30,
            epochs:         100,
            patience:       10,
            test_path:      "test_dataset.csv".to_string(),
            test_labels:    30,
            checkpoint_dir: "checkpoints".to_string(),
            batch_size:     32,
            lr:             1e-5,
            weight_decay:   0.01,
            hidden_size:    128,
            val_fraction:   0.2,
            seed:           0,
        }
    }
}

impl TrainConfig {
    pub fn model_config(&self) -> SequenceModelConfig {
        SequenceModelConfig::new(self.num_labels).with_hidden_size(self.hidden_size)
    }

    /// Reject configurations that could only fail later, mid-run.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.num_labels >= 1, "label count must be at least 1");
        anyhow::ensure!(self.epochs >= 1, "epochs must be at least 1");
        anyhow::ensure!(self.patience >= 1, "patience must be at least 1");
        anyhow::ensure!(self.batch_size >= 1, "batch size must be at least 1");
        anyhow::ensure!(self.hidden_size >= 1, "hidden size must be at least 1");
        anyhow::ensure!(
            self.val_fraction > 0.0 && self.val_fraction < 1.0,
            "validation fraction must be in (0, 1), got {}",
            self.val_fraction
        );
        if self.test_labels != self.num_labels {
            return Err(ClassifierError::shape_mismatch(
                format!("{} test labels (model output width)", self.num_labels),
                format!("{}", self.test_labels),
            )
            .into());
        }
        Ok(())
    }
}

/// What a finished run reports.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub training: TrainingSummary,
    pub test:     TestReport,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;

        // ── Step 1: Validate configuration ────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Load training table ───────────────────────────────────────
        tracing::info!("Loading training data from '{}'", cfg.train_path);
        let dataset = LabeledDataset::from_source(&CsvSampleLoader::new(&cfg.train_path), cfg.num_labels)
            .with_context(|| format!("Cannot load training data '{}'", cfg.train_path))?;
        tracing::info!("Loaded {} samples with {} labels", dataset.size(), dataset.num_labels());

        // ── Step 3: Load test table ───────────────────────────────────────────
        let test_dataset = LabeledDataset::from_source(&CsvSampleLoader::new(&cfg.test_path), cfg.test_labels)
            .with_context(|| format!("Cannot load test data '{}'", cfg.test_path))?;
        tracing::info!("Loaded {} test samples", test_dataset.size());

        // ── Step 4: Train / validation split ──────────────────────────────────
        let (train_dataset, val_dataset) = dataset.split(cfg.val_fraction, cfg.seed)?;
        tracing::info!(
            "Split: {} train, {} validation (seed {})",
            train_dataset.size(),
            val_dataset.size(),
            cfg.seed
        );

        // ── Step 5: Clear old weights, save metadata ─────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.clear_best()?;
        ckpt_manager.save_meta(&CheckpointMeta {
            model:       cfg.model_config(),
            label_names: dataset.label_names().to_vec(),
        })?;

        // ── Step 6: Run the early-stopping loop ───────────────────────────────
        let mut metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
        let training = run_training(cfg, train_dataset, val_dataset, ckpt_manager.clone(), &mut metrics)?;

        // ── Step 7: Evaluate the best checkpoint on the test set ──────────────
        ensure_checkpoint_saved(&training)?;
        let inferencer = Inferencer::from_checkpoint(&ckpt_manager)?;
        let test       = inferencer.evaluate(test_dataset, cfg.batch_size)?;
        tracing::info!(
            "Test: accuracy={:.4} weighted_f1={:.4} over {} samples",
            test.accuracy,
            test.weighted_f1,
            test.samples
        );

        Ok(TrainReport { training, test })
    }
}

/// Best epoch 0 means no validation loss ever improved (e.g. all NaN),
/// so no weights from this run exist to evaluate.
fn ensure_checkpoint_saved(training: &TrainingSummary) -> Result<()> {
    anyhow::ensure!(
        training.best_epoch > 0,
        "no epoch improved the validation loss in {} epochs; no checkpoint to evaluate",
        training.epochs_run
    );
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::early_stopping::StopReason;
    use std::{fs, path::Path};

    const SEQS: [&str; 10] = [
        "ACGUACGUAC", "GGGAAACCCU", "UUUUACGA", "ACGN", "CAGUCAGUCAGU",
        "AAAAA", "GCGCGCGC", "UACGUACG", "CCCAAAGGGUUU", "AUGCAUGC",
    ];

    fn write_binary_csv(path: &Path) {
        let mut text = String::from("sequence,FUS\n");
        for (i, seq) in SEQS.iter().enumerate() {
            text.push_str(&format!("{seq},{}\n", i % 2));
        }
        fs::write(path, text).unwrap();
    }

    fn config(dir: &Path) -> TrainConfig {
        let train = dir.join("train.csv");
        let test  = dir.join("test.csv");
        write_binary_csv(&train);
        write_binary_csv(&test);
        TrainConfig {
            train_path:     train.to_string_lossy().into_owned(),
            test_path:      test.to_string_lossy().into_owned(),
            checkpoint_dir: dir.join("ckpt").to_string_lossy().into_owned(),
            num_labels:     1,
            test_labels:    1,
            epochs:         5,
            patience:       5,
            batch_size:     4,
            hidden_size:    8,
            lr:             1e-3,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_end_to_end_binary_run() {
        let dir    = tempfile::tempdir().unwrap();
        let report = TrainUseCase::new(config(dir.path())).execute().unwrap();

        assert_eq!(report.training.epochs_run, 5);
        assert_eq!(report.training.stop_reason, StopReason::MaxEpochs);
        assert_eq!(report.test.samples, 10);
        assert!((0.0..=1.0).contains(&report.test.accuracy));
        assert!((0.0..=1.0).contains(&report.test.weighted_f1));

        let ckpt = dir.path().join("ckpt");
        assert!(ckpt.join("best_model.mpk").exists());
        assert!(ckpt.join("model_meta.json").exists());
        let metrics = fs::read_to_string(ckpt.join("metrics.csv")).unwrap();
        assert_eq!(metrics.lines().count(), 1 + 5 * 4);
    }

    #[test]
    fn test_schema_error_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            num_labels:  30,
            test_labels: 30,
            ..config(dir.path())
        };
        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClassifierError>(),
            Some(ClassifierError::Schema { expected: 30, .. })
        ));
        assert!(!dir.path().join("ckpt").join("best_model.mpk").exists());
    }

    #[test]
    fn test_label_count_disagreement_rejected() {
        let cfg = TrainConfig {
            num_labels:  1,
            test_labels: 30,
            ..TrainConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClassifierError>(),
            Some(ClassifierError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_run_without_improvement_has_nothing_to_evaluate() {
        let summary = TrainingSummary {
            epochs_run:           3,
            stop_reason:          StopReason::Patience,
            best_epoch:           0,
            best_validation_loss: f64::INFINITY,
            history:              Vec::new(),
        };
        assert!(ensure_checkpoint_saved(&summary).is_err());
        assert!(ensure_checkpoint_saved(&TrainingSummary { best_epoch: 2, ..summary }).is_ok());
    }

    #[test]
    fn test_stale_weights_cleared_before_training() {
        let dir  = tempfile::tempdir().unwrap();
        let cfg  = TrainConfig { epochs: 1, patience: 1, ..config(dir.path()) };
        let ckpt = dir.path().join("ckpt");
        fs::create_dir_all(&ckpt).unwrap();
        fs::write(ckpt.join("best_model.mpk"), b"stale").unwrap();
        fs::write(ckpt.join("best_epoch.json"), "99").unwrap();

        let report = TrainUseCase::new(cfg).execute().unwrap();

        assert_eq!(report.training.best_epoch, 1);
        let epoch = fs::read_to_string(ckpt.join("best_epoch.json")).unwrap();
        assert_eq!(epoch.trim(), "1");
    }

    #[test]
    fn test_default_config_is_valid() {
        TrainConfig::default().validate().unwrap();
    }
}
