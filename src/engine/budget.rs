use std::time::{Duration, Instant};

/// Wall-clock allowance for placing a single word; restarted at every tick.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    threshold: Option<Duration>,
    started: Instant,
}

impl TimeBudget {
    #[must_use]
    pub fn new(threshold: Option<Duration>) -> Self {
        Self {
            threshold: threshold.filter(|t| !t.is_zero()),
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(None)
    }

    pub fn restart(&mut self) {
        self.started = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn exceeded(&self) -> bool {
        self.threshold
            .is_some_and(|threshold| self.started.elapsed() > threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threshold_disables_budget() {
        let budget = TimeBudget::new(Some(Duration::ZERO));
        std::thread::sleep(Duration::from_millis(2));
        assert!(!budget.exceeded());
    }

    #[test]
    fn exceeded_after_threshold() {
        let mut budget = TimeBudget::new(Some(Duration::from_millis(50)));
        std::thread::sleep(Duration::from_millis(60));
        assert!(budget.exceeded());
        budget.restart();
        assert!(!budget.exceeded());
    }
}
