// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// classifier works with: nucleotide sequences, label vectors,
// samples, the error taxonomy and the collaborator traits.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Everything here is testable without a tensor backend.

// The error taxonomy shared by the data and ml layers
pub mod error;

// Nucleotide alphabet and the one-hot sequence encoder
pub mod sequence;

// A (sequence, label vector) training example
pub mod sample;

// Collaborator abstractions (metric sink)
pub mod traits;
