// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The model, the training engine and the metrics.
//
//   model.rs          — LSTM over padded one-hot sequences,
//                       gathered at each sample's last real
//                       timestep, linear head to K logits
//
//   evaluation.rs     — sigmoid + 0.5 threshold, support-
//                       weighted F1, test-time accuracy
//
//   early_stopping.rs — epoch state machine with patience,
//                       backend-free so it can be tested with
//                       a scripted runner
//
//   trainer.rs        — Burn EpochRunner: forward, BCE loss,
//                       backward, AdamW step, validation pass,
//                       best-checkpoint saving
//
//   inferencer.rs     — restored model: test evaluation and
//                       single-sequence prediction
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Hochreiter & Schmidhuber (1997) LSTM

/// LSTM sequence classifier architecture
pub mod model;

/// Weighted F1 and accuracy
pub mod evaluation;

/// Patience-driven epoch loop
pub mod early_stopping;

/// Burn training passes and checkpointing
pub mod trainer;

/// Test evaluation and prediction from a checkpoint
pub mod inferencer;
