// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and delegates everything else to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   — trains on a labelled CSV, reports test scores
//   2. `predict` — loads a checkpoint and scores one sequence
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "rbp-classifier",
    version = "0.1.0",
    about = "Train an LSTM RNA-binding-protein classifier, then score sequences."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case; the CLI layer never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}' ({} labels)", args.train_path, args.labels);

    let report = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training stopped after {} epochs ({:?}); best epoch {}",
        report.training.epochs_run,
        report.training.stop_reason,
        report.training.best_epoch
    );
    if let Some(last) = report.training.last() {
        println!(
            "Final epoch:      train_f1={:.4} validation_f1={:.4}",
            last.train.f1, last.validation.f1
        );
    }
    println!("Test accuracy:    {:.4}", report.test.accuracy);
    println!("Test weighted F1: {:.4}", report.test.weighted_f1);
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case   = PredictUseCase::new(args.checkpoint_dir)?;
    let prediction = use_case.predict(&args.sequence, args.threshold)?;

    for (protein, probability) in &prediction.probabilities {
        println!("{protein:<12} {probability:.4}");
    }
    if prediction.bound.is_empty() {
        println!("\nNo protein reaches the {:.2} threshold", args.threshold);
    } else {
        println!("\nBound: {}", prediction.bound.join(", "));
    }
    Ok(())
}
