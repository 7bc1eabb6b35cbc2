//! Seeded train/test split.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::PipelineError;

/// Row indices for each side of the split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and hold out `ceil(n * test_ratio)` rows.
///
/// Both sides must end up non-empty.
pub fn train_test_split(n: usize, test_ratio: f64, seed: u64) -> Result<Split, PipelineError> {
    if !(test_ratio.is_finite() && test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(PipelineError::Config(format!(
            "test ratio must lie strictly between 0 and 1, got {test_ratio}"
        )));
    }

    let n_test = (n as f64 * test_ratio).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(PipelineError::InsufficientData(format!(
            "{n} usable rows cannot be split into non-empty train and test sets"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = order.split_off(n_test);

    Ok(Split { train, test: order })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_rounds_up() {
        let s = train_test_split(101, 0.2, 42).unwrap();
        assert_eq!(s.test.len(), 21);
        assert_eq!(s.train.len(), 80);

        let mut all: Vec<usize> = s.train.iter().chain(&s.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..101).collect::<Vec<_>>());
    }

    #[test]
    fn split_is_seeded() {
        assert_eq!(train_test_split(50, 0.2, 1).unwrap(), train_test_split(50, 0.2, 1).unwrap());
        assert_ne!(train_test_split(50, 0.2, 1).unwrap(), train_test_split(50, 0.2, 2).unwrap());
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        assert!(matches!(train_test_split(1, 0.2, 0), Err(PipelineError::InsufficientData(_))));
        assert!(matches!(train_test_split(10, 1.0, 0), Err(PipelineError::Config(_))));
    }
}
