/// Progress through one batch
///
/// Advances by one per file whether the file converted or not, so the
/// fraction never goes backwards and hits exactly 1.0 after the last file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    completed: usize,
    failed: usize,
    total: usize,
}

impl ProgressState {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            failed: 0,
            total,
        }
    }

    /// Record a finished file, returns the number of files done so far
    pub fn advance(&mut self, success: bool) -> usize {
        if self.done() < self.total {
            if success {
                self.completed += 1;
            } else {
                self.failed += 1;
            }
        }
        self.done()
    }

    pub fn done(&self) -> usize {
        self.completed + self.failed
    }

    pub fn completed_count(&self) -> usize {
        self.completed
    }

    pub fn failed_count(&self) -> usize {
        self.failed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Fraction of files processed, in [0, 1]. An empty batch is complete.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        if self.done() == self.total {
            return 1.0;
        }
        self.done() as f32 / self.total as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts() {
        let mut progress = ProgressState::new(3);
        assert_eq!(progress.fraction(), 0.0);

        assert_eq!(progress.advance(true), 1);
        assert_eq!(progress.advance(false), 2);
        assert_eq!(progress.completed_count(), 1);
        assert_eq!(progress.failed_count(), 1);
    }

    #[test]
    fn test_progress_reaches_one_regardless_of_failures() {
        let mut progress = ProgressState::new(3);
        progress.advance(false);
        progress.advance(false);
        progress.advance(false);
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut progress = ProgressState::new(7);
        let mut last = progress.fraction();
        for i in 0..7 {
            progress.advance(i % 2 == 0);
            let now = progress.fraction();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn test_progress_does_not_overshoot() {
        let mut progress = ProgressState::new(1);
        progress.advance(true);
        assert_eq!(progress.advance(true), 1);
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn test_empty_batch_is_complete() {
        assert_eq!(ProgressState::new(0).fraction(), 1.0);
    }
}
