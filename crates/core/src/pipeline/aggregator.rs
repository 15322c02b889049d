/// Running mean over successfully classified faces.
///
/// Owned exclusively by one pipeline run; concurrent runs each build
/// their own accumulator, so no state leaks between analyses. Failed
/// and discarded faces never reach `add`, keeping the mean strictly
/// over Ok scores.
#[derive(Debug, Default)]
pub struct ScoreAccumulator {
    sum: f64,
    count: usize,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, score: f64) {
        self.sum += score;
        self.count += 1;
    }

    /// Number of Ok scores folded in so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Arithmetic mean, or `None` when nothing was scored.
    ///
    /// The guard makes the "zero faces" outcome explicit instead of
    /// letting a division by zero produce NaN.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_accumulator_has_no_mean() {
        let acc = ScoreAccumulator::new();
        assert_eq!(acc.count(), 0);
        assert_eq!(acc.mean(), None);
    }

    #[test]
    fn test_single_score() {
        let mut acc = ScoreAccumulator::new();
        acc.add(0.7);
        assert_eq!(acc.count(), 1);
        assert_relative_eq!(acc.mean().unwrap(), 0.7);
    }

    #[test]
    fn test_mean_of_two_scores() {
        // The documented reference scenario: 0.9 and 0.3 average to 0.6
        let mut acc = ScoreAccumulator::new();
        acc.add(0.9);
        acc.add(0.3);
        assert_eq!(acc.count(), 2);
        assert_relative_eq!(acc.mean().unwrap(), 0.6);
    }

    #[test]
    fn test_mean_never_nan() {
        let acc = ScoreAccumulator::new();
        // None, not NaN
        assert!(acc.mean().is_none());
    }

    #[test]
    fn test_extreme_scores() {
        let mut acc = ScoreAccumulator::new();
        acc.add(0.0);
        acc.add(1.0);
        assert_relative_eq!(acc.mean().unwrap(), 0.5);
    }

    #[test]
    fn test_independent_accumulators() {
        let mut a = ScoreAccumulator::new();
        let mut b = ScoreAccumulator::new();
        a.add(1.0);
        b.add(0.0);
        assert_relative_eq!(a.mean().unwrap(), 1.0);
        assert_relative_eq!(b.mean().unwrap(), 0.0);
    }
}
