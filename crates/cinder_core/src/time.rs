//! Fixed-step time accumulation
//!
//! Physics sub-steps and render throttling both consume variable frame time in
//! whole fixed intervals.

/// Default fixed rate (60 Hz = 16.666ms per tick)
pub const TICK_RATE_HZ: u32 = 60;

/// Accumulates frame time and releases it in fixed-size steps.
#[derive(Debug, Clone)]
pub struct FixedStep {
    interval: f32,
    accumulated: f32,
    tick_count: u64,
}

impl FixedStep {
    /// `interval` is in seconds and must be positive.
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(f32::EPSILON),
            accumulated: 0.0,
            tick_count: 0,
        }
    }

    pub fn from_rate(hz: u32) -> Self {
        Self::new(1.0 / hz.max(1) as f32)
    }

    #[inline]
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Time carried over that has not yet filled a step.
    #[inline]
    pub fn accumulated(&self) -> f32 {
        self.accumulated
    }

    /// Steps released so far.
    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulated += delta.max(0.0);
    }

    /// Consume one interval if enough time has accumulated.
    pub fn next_step(&mut self) -> bool {
        if self.accumulated < self.interval {
            return false;
        }
        self.accumulated -= self.interval;
        self.tick_count += 1;
        true
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::from_rate(TICK_RATE_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn releases_whole_steps_and_keeps_remainder() {
        let mut step = FixedStep::new(0.25);

        step.accumulate(0.6);
        let mut steps = 0;
        while step.next_step() {
            steps += 1;
        }

        assert_eq!(steps, 2);
        assert!((step.accumulated() - 0.1).abs() < 1e-6);
        assert_eq!(step.tick_count(), 2);
    }

    #[test]
    fn remainder_carries_into_next_frame() {
        let mut step = FixedStep::new(0.25);

        step.accumulate(0.2);
        assert!(!step.next_step());
        step.accumulate(0.1);
        assert!(step.next_step());
        assert!(!step.next_step());
    }

    #[test]
    fn default_runs_at_tick_rate() {
        let step = FixedStep::default();
        assert!((step.interval() - 1.0 / 60.0).abs() < 1e-6);
        assert_eq!(step.interval(), 1.0 / TICK_RATE_HZ as f32);
    }

    #[test]
    fn negative_delta_is_ignored() {
        let mut step = FixedStep::new(0.1);
        step.accumulate(-1.0);
        assert_eq!(step.accumulated(), 0.0);
    }
}
