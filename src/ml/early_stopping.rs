// ============================================================
// Layer 5 — Early-Stopping Training Loop
// ============================================================
// Epoch-level state machine, independent of Burn:
//
//   Training ──► Validating ──┬─► ImprovedCheckpoint ──┐
//      ▲                      │    (stalls = 0, save,   │
//      │                      │     best = val loss)    │
//      │                      └─► Stalled ──────────────┤
//      │                           (stalls += 1)        │
//      └──────────── continue ◄─────────────────────────┤
//                                                       ▼
//                     Stopped ◄── stalls == patience or epoch == max_epochs
//
// "Improved" means strictly lower than the best validation
// loss seen so far; the best starts at +∞, so the first epoch
// always improves. The passes themselves are delegated to an
// EpochRunner: the Burn trainer in production, a scripted
// runner in tests.

use anyhow::Result;

use crate::domain::traits::MetricSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Training,
    Validating,
    ImprovedCheckpoint,
    Stalled,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `patience` consecutive epochs without improvement
    Patience,
    /// `max_epochs` epochs completed
    MaxEpochs,
}

/// Loss and mean per-batch weighted F1 of one full pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassSummary {
    /// Σ (batch mean loss × batch size) / samples in the partition
    pub loss: f64,
    pub f1:   f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    pub epoch:      usize,
    pub train:      PassSummary,
    pub validation: PassSummary,
    pub phase:      Phase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub epochs_run:           usize,
    pub stop_reason:          StopReason,
    pub best_epoch:           usize,
    pub best_validation_loss: f64,
    pub history:              Vec<EpochReport>,
}

impl TrainingSummary {
    pub fn last(&self) -> Option<&EpochReport> {
        self.history.last()
    }
}

// ─── TrainingRunState ─────────────────────────────────────────────────────────
/// Lives for one call of `TrainingLoop::run`; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRunState {
    pub best_validation_loss:       f64,
    pub epochs_without_improvement: usize,
    pub current_epoch:              usize,
    pub best_epoch:                 usize,
}

impl Default for TrainingRunState {
    fn default() -> Self {
        Self {
            best_validation_loss:       f64::INFINITY,
            epochs_without_improvement: 0,
            current_epoch:              0,
            best_epoch:                 0,
        }
    }
}

impl TrainingRunState {
    /// Record the validation loss of the current epoch.
    /// Returns ImprovedCheckpoint or Stalled.
    pub fn observe(&mut self, validation_loss: f64) -> Phase {
        if validation_loss < self.best_validation_loss {
            self.best_validation_loss       = validation_loss;
            self.epochs_without_improvement = 0;
            self.best_epoch                 = self.current_epoch;
            Phase::ImprovedCheckpoint
        } else {
            self.epochs_without_improvement += 1;
            Phase::Stalled
        }
    }

    pub fn stop_reason(&self, patience: usize, max_epochs: usize) -> Option<StopReason> {
        if self.epochs_without_improvement >= patience {
            Some(StopReason::Patience)
        } else if self.current_epoch >= max_epochs {
            Some(StopReason::MaxEpochs)
        } else {
            None
        }
    }
}

// ─── EpochRunner ──────────────────────────────────────────────────────────────
/// The work behind one epoch. Epochs are numbered from 1.
pub trait EpochRunner {
    /// One optimisation pass over the training partition.
    fn train_epoch(&mut self, epoch: usize) -> Result<PassSummary>;

    /// One gradient-free pass over the validation partition.
    fn validate_epoch(&mut self, epoch: usize) -> Result<PassSummary>;

    /// Persist the current weights as the best checkpoint.
    fn save_checkpoint(&mut self, epoch: usize) -> Result<()>;
}

// ─── TrainingLoop ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy)]
pub struct TrainingLoop {
    pub max_epochs: usize,
    pub patience:   usize,
}

impl TrainingLoop {
    pub fn new(max_epochs: usize, patience: usize) -> Result<Self> {
        anyhow::ensure!(max_epochs >= 1, "max_epochs must be at least 1");
        anyhow::ensure!(patience >= 1, "patience must be at least 1");
        Ok(Self { max_epochs, patience })
    }

    /// Drive epochs until patience or the epoch budget runs out.
    ///
    /// Metric sink failures are logged and ignored; runner errors abort.
    pub fn run<R, S>(&self, runner: &mut R, sink: &mut S) -> Result<TrainingSummary>
    where
        R: EpochRunner + ?Sized,
        S: MetricSink + ?Sized,
    {
        let mut state   = TrainingRunState::default();
        let mut history = Vec::new();

        let stop_reason = loop {
            state.current_epoch += 1;
            let epoch = state.current_epoch;

            tracing::debug!("Epoch {epoch}: {:?}", Phase::Training);
            let train = runner.train_epoch(epoch)?;

            tracing::debug!("Epoch {epoch}: {:?}", Phase::Validating);
            let validation = runner.validate_epoch(epoch)?;

            let phase = state.observe(validation.loss);
            if phase == Phase::ImprovedCheckpoint {
                runner.save_checkpoint(epoch)?;
            }

            tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | train_f1={:.4} | val_f1={:.4} | {:?}",
                epoch, self.max_epochs, train.loss, validation.loss, train.f1, validation.f1, phase,
            );

            record_epoch(sink, epoch, &train, &validation);
            history.push(EpochReport { epoch, train, validation, phase });

            if let Some(reason) = state.stop_reason(self.patience, self.max_epochs) {
                tracing::debug!("Epoch {epoch}: {:?} ({reason:?})", Phase::Stopped);
                break reason;
            }
        };

        Ok(TrainingSummary {
            epochs_run: state.current_epoch,
            stop_reason,
            best_epoch: state.best_epoch,
            best_validation_loss: state.best_validation_loss,
            history,
        })
    }
}

fn record_epoch<S: MetricSink + ?Sized>(
    sink:       &mut S,
    epoch:      usize,
    train:      &PassSummary,
    validation: &PassSummary,
) {
    let points = [
        ("train_loss", train.loss),
        ("train_f1", train.f1),
        ("validation_loss", validation.loss),
        ("validation_f1", validation.f1),
    ];
    for (name, value) in points {
        if let Err(e) = sink.record(name, value, epoch) {
            tracing::warn!("Metric sink failed for '{name}' at epoch {epoch}: {e:#}");
        }
    }
}
