use crate::ml::error::{MlError, MlResult};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;

/// Row indices of a train/evaluation partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Shuffle `n_samples` row indices with `rng` and hold out `test_fraction` of them.
    ///
    /// The held-out size is `round(n * test_fraction)` clamped to `[1, n - 1]` so both
    /// sides always receive at least one row.
    pub fn new<R: Rng + ?Sized>(
        n_samples: usize,
        test_fraction: f64,
        rng: &mut R,
    ) -> MlResult<Self> {
        if n_samples < 2 {
            return Err(MlError::InsufficientData(format!(
                "cannot split {} rows into training and evaluation sets",
                n_samples
            )));
        }
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(MlError::InvalidConfiguration(format!(
                "test fraction must lie in (0, 1), got {}",
                test_fraction
            )));
        }

        let n_test = Self::test_size(n_samples, test_fraction);

        let mut indices: Vec<usize> = (0..n_samples).collect();
        indices.shuffle(rng);
        let train = indices.split_off(n_test);

        Ok(Self {
            train,
            test: indices,
        })
    }

    /// Number of held-out rows for a given table size
    pub fn test_size(n_samples: usize, test_fraction: f64) -> usize {
        let n_test = (n_samples as f64 * test_fraction).round() as usize;
        n_test.clamp(1, n_samples.saturating_sub(1).max(1))
    }

    pub fn select_rows(&self, features: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
        (
            features.select(Axis(0), &self.train),
            features.select(Axis(0), &self.test),
        )
    }

    pub fn select_targets<T: Clone>(&self, target: &Array1<T>) -> (Array1<T>, Array1<T>) {
        (
            target.select(Axis(0), &self.train),
            target.select(Axis(0), &self.test),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_split_partitions_rows() {
        for n in 2..60 {
            let mut rng = StdRng::seed_from_u64(42);
            let split = TrainTestSplit::new(n, 0.2, &mut rng).unwrap();

            assert_eq!(split.train.len() + split.test.len(), n);
            assert!(!split.train.is_empty());
            assert!(!split.test.is_empty());

            let train: HashSet<_> = split.train.iter().collect();
            let test: HashSet<_> = split.test.iter().collect();
            assert!(train.is_disjoint(&test));
            assert_eq!(train.len() + test.len(), n);
        }
    }

    #[test]
    fn test_split_sizes() {
        assert_eq!(TrainTestSplit::test_size(25, 0.2), 5);
        assert_eq!(TrainTestSplit::test_size(10, 0.2), 2);
        assert_eq!(TrainTestSplit::test_size(13, 0.2), 3);
        // round(0.4) = 0 is lifted so evaluation is never empty
        assert_eq!(TrainTestSplit::test_size(2, 0.2), 1);
        assert_eq!(TrainTestSplit::test_size(3, 0.9), 2);
    }

    #[test]
    fn test_split_is_deterministic() {
        let a = TrainTestSplit::new(25, 0.2, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = TrainTestSplit::new(25, 0.2, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_rejects_single_row() {
        let err = TrainTestSplit::new(1, 0.2, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, MlError::InsufficientData(_)));
    }

    #[test]
    fn test_select_rows() {
        let features = Array2::from_shape_fn((4, 2), |(i, j)| (i * 10 + j) as f64);
        let target = Array1::from(vec![0.0, 1.0, 2.0, 3.0]);
        let split = TrainTestSplit {
            train: vec![3, 0, 1],
            test: vec![2],
        };

        let (x_train, x_test) = split.select_rows(&features);
        let (y_train, y_test) = split.select_targets(&target);

        assert_eq!(x_train.row(0).to_vec(), vec![30.0, 31.0]);
        assert_eq!(x_test.row(0).to_vec(), vec![20.0, 21.0]);
        assert_eq!(y_train.to_vec(), vec![3.0, 0.0, 1.0]);
        assert_eq!(y_test.to_vec(), vec![2.0]);
    }
}
