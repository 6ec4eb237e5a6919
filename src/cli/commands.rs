// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `predict`
// and all their configurable flags.
//
// `train` keeps the classic positional order
//   <train.csv> <labels> <epochs> <patience> <test.csv> <test_labels>
// with everything else behind --flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::{predict_use_case::DEFAULT_THRESHOLD, train_use_case::TrainConfig};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the RBP classifier and evaluate it on a test CSV
    Train(TrainArgs),

    /// Score one RNA sequence with a trained checkpoint
    Predict(PredictArgs),
}

/// Only the binary (1) and full multi-label (30) setups are supported.
fn parse_label_count(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(k @ (1 | 30)) => Ok(k),
        Ok(k)            => Err(format!("label count must be 1 or 30, got {k}")),
        Err(e)           => Err(e.to_string()),
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Training CSV: [id,] sequence, then one 0/1 column per protein
    pub train_path: String,

    /// Number of label columns (1 = binary, 30 = multi-label)
    #[arg(value_parser = parse_label_count)]
    pub labels: usize,

    /// Maximum number of epochs
    pub epochs: usize,

    /// Epochs without validation improvement before stopping
    pub patience: usize,

    /// Test CSV with the same layout as the training file
    pub test_path: String,

    /// Number of label columns in the test file
    #[arg(value_parser = parse_label_count)]
    pub test_labels: usize,

    /// Directory for the best checkpoint, metadata and metrics.csv
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Number of samples processed together in one forward pass
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// AdamW learning rate
    #[arg(long, default_value_t = 1e-5)]
    pub lr: f64,

    /// AdamW decoupled weight decay
    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f32,

    /// LSTM hidden state width
    #[arg(long, default_value_t = 128)]
    pub hidden_size: usize,

    /// Share of the training file held out for validation
    #[arg(long, default_value_t = 0.2)]
    pub val_fraction: f64,

    /// Seed for the split and for weight initialisation
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_path:     a.train_path,
            num_labels:     a.labels,
            epochs:         a.epochs,
            patience:       a.patience,
            test_path:      a.test_path,
            test_labels:    a.test_labels,
            checkpoint_dir: a.checkpoint_dir,
            batch_size:     a.batch_size,
            lr:             a.lr,
            weight_decay:   a.weight_decay,
            hidden_size:    a.hidden_size,
            val_fraction:   a.val_fraction,
            seed:           a.seed,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Raw RNA sequence (A/C/G/U, T accepted)
    pub sequence: String,

    /// Directory where `train` saved its checkpoint
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Probability at or above which a protein counts as bound
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_positionals_map_to_config() {
        let cli = Cli::try_parse_from([
            "rbp-classifier", "train", "train.csv", "30", "50", "5", "test.csv", "30", "--seed", "7",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.num_labels, 30);
        assert_eq!(cfg.epochs, 50);
        assert_eq!(cfg.patience, 5);
        assert_eq!(cfg.test_path, "test.csv");
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.batch_size, 32);
    }

    #[test]
    fn test_label_count_outside_supported_rejected() {
        assert!(Cli::try_parse_from([
            "rbp-classifier", "train", "a.csv", "7", "10", "2", "b.csv", "7",
        ])
        .is_err());
    }

    #[test]
    fn test_predict_defaults() {
        let cli = Cli::try_parse_from(["rbp-classifier", "predict", "ACGU"]).unwrap();
        let Commands::Predict(args) = cli.command else { panic!("expected predict") };
        assert_eq!(args.threshold, DEFAULT_THRESHOLD);
        assert_eq!(args.checkpoint_dir, "checkpoints");
    }
}
