/// Decides when a transfer has moved far enough to report progress, so that
/// events are emitted per fraction of the file rather than per chunk.
pub struct ProgressTracker {
    total: u64,
    step: u64,
    next_report: u64,
}

impl ProgressTracker {
    pub fn new(total: u64, interval: f32) -> ProgressTracker {
        let step = ((total as f64) * interval.clamp(0.0, 1.0) as f64).ceil() as u64;
        let step = step.max(1);

        ProgressTracker {
            total,
            step,
            next_report: step,
        }
    }

    /// Returns true when `current` crossed the next reporting threshold.
    pub fn update(&mut self, current: u64) -> bool {
        if current < self.next_report || self.total == 0 {
            return false;
        }

        while self.next_report <= current {
            self.next_report += self.step;
        }
        true
    }
}
