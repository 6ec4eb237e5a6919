// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a CSV file on disk to padded tensor batches.
//
//   CSV table
//       │
//       ▼
//   CsvSampleLoader   → parses rows, one-hot encodes sequences
//       │
//       ▼
//   LabeledDataset    → fixed-order samples, seeded split,
//       │               implements Burn's Dataset trait
//       ▼
//   SequenceBatcher   → pads variable-length sequences and
//       │               records their true lengths
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads labelled RNA tables with the csv crate
pub mod loader;

/// Implements Burn's Dataset trait for labelled samples
pub mod dataset;

/// Pads samples into tensor batches (Burn's Batcher trait)
pub mod batcher;

/// Seeded shuffle and train/validation split
pub mod splitter;

#[cfg(test)]
pub(crate) mod fixtures;
