// ============================================================
// Layer 5 — Training Loop (Burn)
// ============================================================
// Burn side of the early-stopping loop: one EpochRunner that
// owns the model, the AdamW optimiser and both data loaders.
//
// Key Burn insight:
//   - Training uses TrainBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns the model on the inner backend
//     (NdArray), so validation builds no autodiff graph
//   - the validation batcher must use the inner backend too
//
// Loss per pass = Σ (batch mean BCE × batch size) / partition
// size, so a short final batch weighs no more than its samples.
// F1 per pass = mean of per-batch weighted F1.
//
// Reference: Burn Book §5 (Training)

use std::sync::Arc;

use anyhow::{Context, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{SequenceBatch, SequenceBatcher},
    dataset::LabeledDataset,
};
use crate::domain::traits::MetricSink;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::early_stopping::{EpochRunner, PassSummary, TrainingLoop, TrainingSummary};
use crate::ml::evaluation::HostBatch;
use crate::ml::model::SequenceModel;

pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Train on `train_dataset`, early-stop on `val_dataset`, keep the best
/// weights in `checkpoints`.
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: LabeledDataset,
    val_dataset:   LabeledDataset,
    checkpoints:   CheckpointManager,
    sink:          &mut dyn MetricSink,
) -> Result<TrainingSummary> {
    let device = burn::backend::ndarray::NdArrayDevice::Cpu;
    tracing::info!("Using NdArray device: {:?}", device);
    train_loop::<TrainBackend>(cfg, train_dataset, val_dataset, checkpoints, sink, device)
}

fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: LabeledDataset,
    val_dataset:   LabeledDataset,
    checkpoints:   CheckpointManager,
    sink:          &mut dyn MetricSink,
    device:        B::Device,
) -> Result<TrainingSummary> {
    let schedule = TrainingLoop::new(cfg.epochs, cfg.patience)?;

    // ── Build model ───────────────────────────────────────────────────────────
    B::seed(cfg.seed);
    let model_cfg = cfg.model_config();
    let model: SequenceModel<B> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: LSTM hidden={}, labels={}, {} parameters",
        model_cfg.hidden_size,
        model_cfg.num_labels,
        model.num_params()
    );

    // ── AdamW optimiser ───────────────────────────────────────────────────────
    let optim = AdamWConfig::new()
        .with_weight_decay(cfg.weight_decay)
        .init::<B, SequenceModel<B>>();

    // ── Data loaders: no shuffle, no worker threads → dataset order ──────────
    let train_samples = train_dataset.size();
    let val_samples   = val_dataset.size();

    let train_loader = DataLoaderBuilder::new(SequenceBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .build(train_dataset);

    let val_loader = DataLoaderBuilder::new(SequenceBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .build(val_dataset);

    let mut runner = BurnEpochRunner {
        model,
        optim,
        lr: cfg.lr,
        train_loader,
        val_loader,
        train_samples,
        val_samples,
        checkpoints,
    };

    let summary = schedule.run(&mut runner, sink)?;
    tracing::info!(
        "Training stopped after {} epochs ({:?}); best epoch {} with val_loss={:.4}",
        summary.epochs_run,
        summary.stop_reason,
        summary.best_epoch,
        summary.best_validation_loss,
    );
    Ok(summary)
}

// ─── BurnEpochRunner ──────────────────────────────────────────────────────────
/// Sole owner of the model while training runs; only the optimiser
/// step replaces it.
pub struct BurnEpochRunner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<SequenceModel<B>, B>,
{
    model:         SequenceModel<B>,
    optim:         O,
    lr:            f64,
    train_loader:  Arc<dyn DataLoader<SequenceBatch<B>>>,
    val_loader:    Arc<dyn DataLoader<SequenceBatch<B::InnerBackend>>>,
    train_samples: usize,
    val_samples:   usize,
    checkpoints:   CheckpointManager,
}

impl<B, O> EpochRunner for BurnEpochRunner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<SequenceModel<B>, B>,
{
    fn train_epoch(&mut self, epoch: usize) -> Result<PassSummary> {
        let mut acc = PassAccumulator::default();

        for batch in self.train_loader.iter() {
            let batch_size = batch.batch_size();

            // Gradients are rebuilt from each loss, so there is nothing to zero
            let (loss, output) = self
                .model
                .forward_loss(batch.inputs, &batch.lengths, batch.labels.clone())
                .with_context(|| format!("training batch in epoch {epoch}"))?;

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            let f1 = HostBatch::from_tensors(output.logits, batch.labels)?.weighted_f1()?;

            // Backward pass + AdamW update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &self.model);
            self.model = self.optim.step(self.lr, self.model.clone(), grads);

            acc.add(loss_val, batch_size, f1);
        }

        Ok(acc.finish(self.train_samples))
    }

    fn validate_epoch(&mut self, epoch: usize) -> Result<PassSummary> {
        let model = self.model.valid();
        let mut acc = PassAccumulator::default();

        for batch in self.val_loader.iter() {
            let batch_size = batch.batch_size();
            let (loss, output) = model
                .forward_loss(batch.inputs, &batch.lengths, batch.labels.clone())
                .with_context(|| format!("validation batch in epoch {epoch}"))?;

            let loss_val: f64 = loss.into_scalar().elem::<f64>();
            let f1 = HostBatch::from_tensors(output.logits, batch.labels)?.weighted_f1()?;
            acc.add(loss_val, batch_size, f1);
        }

        Ok(acc.finish(self.val_samples))
    }

    fn save_checkpoint(&mut self, epoch: usize) -> Result<()> {
        self.checkpoints.save_best(&self.model, epoch)?;
        tracing::debug!("Best checkpoint updated at epoch {}", epoch);
        Ok(())
    }
}

// ─── PassAccumulator ──────────────────────────────────────────────────────────
#[derive(Debug, Default)]
struct PassAccumulator {
    loss_sum: f64,
    f1_sum:   f64,
    batches:  usize,
}

impl PassAccumulator {
    /// `batch_loss` is the mean over the batch's samples and labels.
    fn add(&mut self, batch_loss: f64, batch_size: usize, f1: f64) {
        self.loss_sum += batch_loss * batch_size as f64;
        self.f1_sum   += f1;
        self.batches  += 1;
    }

    fn finish(self, samples: usize) -> PassSummary {
        PassSummary {
            loss: self.loss_sum / samples.max(1) as f64,
            f1:   self.f1_sum / self.batches.max(1) as f64,
        }
    }
}
