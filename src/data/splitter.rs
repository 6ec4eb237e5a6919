// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles samples with a seeded RNG and splits them into:
//   - Training set:   used to update model weights
//   - Validation set: drives early stopping
//
// The RNG is seeded explicitly (StdRng::seed_from_u64), so the
// same seed and fraction always give the same partition. Early
// stopping decisions are only reproducible across runs if the
// validation set is.
//
// The validation share is rounded up, e.g. 10 samples with a
// 0.2 fraction → 8 train / 2 validation.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, validation).
///
/// `val_fraction` is clamped to [0, 1].
pub fn split_train_val<T>(mut samples: Vec<T>, val_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);

    // Fisher-Yates shuffle via SliceRandom
    samples.shuffle(&mut rng);

    let total     = samples.len();
    let val_count = ((total as f64) * val_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let split_at  = total - val_count.min(total);

    // samples = [0..split_at], val = [split_at..total]
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split (seed {}): {} training, {} validation",
        seed,
        samples.len(),
        val.len(),
    );

    (samples, val)
}
