// ============================================================
// Layer 4 — CSV Sample Loader
// ============================================================
// Reads a labelled RNA table with the csv crate.
//
// Accepted layouts (decided from the header and the requested K):
//
//   K + 1 columns:  sequence, label_1, ..., label_K
//   K + 2 columns:  id, sequence, label_1, ..., label_K
//
// Any other column count is a schema error, reported before a
// single row is parsed. Label headers become protein names.
//
// The column count alone can mistake a sequence-first table with
// one extra label for the id layout. The chosen sequence column
// must therefore hold at least one nucleotide symbol somewhere,
// or the table is rejected as a schema error.
//
// Each label cell must parse as 0 or 1 ("0", "1", "0.0", "1.0").
// An empty sequence cell is rejected, since every sample needs
// at least one timestep.

use std::{fs::File, io::Read, path::PathBuf};

use crate::domain::{
    error::{ClassifierError, ClassifierResult},
    sample::{LabelVector, LabeledTable, Sample},
    sequence::{encode, Nucleotide},
    traits::SampleSource,
};

/// Loads samples from a CSV file on disk.
pub struct CsvSampleLoader {
    path: PathBuf,
}

impl CsvSampleLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SampleSource for CsvSampleLoader {
    fn load_table(&self, num_labels: usize) -> ClassifierResult<LabeledTable> {
        let file  = File::open(&self.path)?;
        let table = read_table(file, num_labels)?;
        tracing::debug!(
            "Read {} samples with {} labels from '{}'",
            table.samples.len(),
            num_labels,
            self.path.display()
        );
        Ok(table)
    }
}

/// Parse a CSV stream into a `LabeledTable` with exactly `num_labels` labels.
pub fn read_table<R: Read>(input: R, num_labels: usize) -> ClassifierResult<LabeledTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    // Column of the sequence; labels follow it directly
    let seq_col = if headers.len() == num_labels + 1 {
        0
    } else if headers.len() == num_labels + 2 {
        1
    } else {
        return Err(ClassifierError::Schema {
            expected: num_labels,
            found:    headers.len().saturating_sub(1),
            detail:   format!(
                "{} columns; expected {} (sequence + labels) or {} (id + sequence + labels)",
                headers.len(),
                num_labels + 1,
                num_labels + 2
            ),
        });
    };

    let label_names = headers[seq_col + 1..].to_vec();
    let mut samples = Vec::new();
    let mut saw_nucleotide = false;

    for (row, record) in reader.records().enumerate() {
        let record = record?;

        let raw_seq = record.get(seq_col).unwrap_or("");
        if raw_seq.is_empty() {
            return Err(ClassifierError::InvalidRow {
                row,
                reason: "empty sequence".to_string(),
            });
        }

        saw_nucleotide |= raw_seq.chars().any(|c| Nucleotide::from_char(c).is_some());

        let labels = record
            .iter()
            .skip(seq_col + 1)
            .map(|cell| parse_label(cell, row))
            .collect::<ClassifierResult<Vec<f32>>>()?;

        samples.push(Sample::new(encode(raw_seq), LabelVector::new(labels)));
    }

    if !samples.is_empty() && !saw_nucleotide {
        return Err(ClassifierError::Schema {
            expected: num_labels,
            found:    headers.len() - 1,
            detail:   format!(
                "column '{}' holds no nucleotide symbols; label columns do not match {} labels",
                headers[seq_col],
                num_labels
            ),
        });
    }

    Ok(LabeledTable { label_names, samples })
}

fn parse_label(cell: &str, row: usize) -> ClassifierResult<f32> {
    match cell.parse::<f32>() {
        Ok(v) if v == 0.0 || v == 1.0 => Ok(v),
        _ => Err(ClassifierError::InvalidRow {
            row,
            reason: format!("label value '{cell}' is not 0 or 1"),
        }),
    }
}
