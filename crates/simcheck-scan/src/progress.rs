//! Batch progress reporting.

use std::time::Duration;

/// Progress information after each submission.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    /// Submissions handled so far, including failures.
    pub processed: usize,
    /// Submissions found under the root.
    pub total: usize,
    /// Identity of the submission just handled.
    pub current: String,
    /// Failures so far.
    pub failures: usize,
    /// Time elapsed since the batch started.
    pub elapsed: Duration,
}

impl BatchProgress {
    /// Fraction of the batch done, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total > 0 {
            self.processed as f64 / self.total as f64
        } else {
            1.0
        }
    }

    /// Successful submissions so far.
    pub fn successes(&self) -> usize {
        self.processed.saturating_sub(self.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        let mut progress = BatchProgress {
            processed: 1,
            total: 4,
            current: "ana".to_string(),
            failures: 1,
            elapsed: Duration::ZERO,
        };
        assert_eq!(progress.fraction(), 0.25);
        assert_eq!(progress.successes(), 0);

        progress.total = 0;
        assert_eq!(progress.fraction(), 1.0);
    }
}
