// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Local-file collaborators of the training engine:
//
//   checkpoint.rs — best-model persistence
//                   Burn file recorder for the weights, JSON
//                   for the model config and protein names so
//                   inference can rebuild the model.
//
//   metrics.rs    — MetricSink writing one CSV row per
//                   (name, value, step) triple.
//
// Reference: Burn Book §5 (Checkpointing)

/// Best-model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
