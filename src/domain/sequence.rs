// ============================================================
// Layer 3 — Sequence Encoder
// ============================================================
// Turns a raw nucleotide string into an L × 4 one-hot matrix.
//
// Channel order (fixed — it defines the model's input channels):
//
//   column 0 → A
//   column 1 → C
//   column 2 → G
//   column 3 → U  (T is read as U, so DNA-style input works)
//
// Lowercase input is accepted. Any other symbol (N, '-', '.',
// IUPAC ambiguity codes, ...) becomes the all-zero row, so a
// batch with ambiguous bases never stops the pipeline.
//
// Example:
//   "ACGN" → [[1,0,0,0],
//             [0,1,0,0],
//             [0,0,1,0],
//             [0,0,0,0]]

use serde::{Deserialize, Serialize};

/// Number of input channels, one per nucleotide.
pub const ALPHABET_SIZE: usize = 4;

/// A single one-hot row.
pub type OneHot = [f32; ALPHABET_SIZE];

/// Row emitted for symbols outside the alphabet.
pub const UNKNOWN_ROW: OneHot = [0.0; ALPHABET_SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nucleotide {
    A,
    C,
    G,
    U,
}

impl Nucleotide {
    /// Parse one symbol. T/t is folded onto U.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'C' => Some(Self::C),
            'G' => Some(Self::G),
            'U' | 'T' => Some(Self::U),
            _ => None,
        }
    }

    /// Column of this nucleotide in the one-hot matrix.
    pub fn channel(self) -> usize {
        match self {
            Self::A => 0,
            Self::C => 1,
            Self::G => 2,
            Self::U => 3,
        }
    }

    pub fn one_hot(self) -> OneHot {
        let mut row = UNKNOWN_ROW;
        row[self.channel()] = 1.0;
        row
    }
}

/// An encoded sequence: one row per input symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedSequence {
    rows: Vec<OneHot>,
}

impl EncodedSequence {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[OneHot] {
        &self.rows
    }
}

/// Encode a nucleotide string. Pure and infallible.
pub fn encode(sequence: &str) -> EncodedSequence {
    let rows = sequence
        .chars()
        .map(|c| Nucleotide::from_char(c).map_or(UNKNOWN_ROW, Nucleotide::one_hot))
        .collect();
    EncodedSequence { rows }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn row_sum(row: &OneHot) -> f32 {
        row.iter().sum()
    }

    #[test]
    fn test_shape_and_row_sums() {
        let enc = encode("ACGUACGU");
        assert_eq!(enc.len(), 8);
        for row in enc.rows() {
            assert_eq!(row_sum(row), 1.0);
        }
    }

    #[test]
    fn test_channel_order() {
        let enc = encode("ACGU");
        assert_eq!(enc.rows()[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(enc.rows()[1], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(enc.rows()[2], [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(enc.rows()[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_thymine_and_lowercase() {
        // T and lowercase symbols land on the same channels
        assert_eq!(encode("t"), encode("U"));
        assert_eq!(encode("acg"), encode("ACG"));
    }

    #[test]
    fn test_unknown_symbols_are_zero_rows() {
        let enc = encode("ANX-");
        assert_eq!(enc.rows()[0], [1.0, 0.0, 0.0, 0.0]);
        for row in &enc.rows()[1..] {
            assert_eq!(*row, UNKNOWN_ROW);
        }
    }

    #[test]
    fn test_empty_string() {
        assert!(encode("").is_empty());
    }
}
