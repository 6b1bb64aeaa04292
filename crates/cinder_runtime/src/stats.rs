//! Frame statistics
//!
//! Rolling frame time average plus the cost of each subsystem during the last
//! tick.

use std::fmt;
use std::time::{Duration, Instant};

/// Subsystems timed by the engine, in tick order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Subsystem {
    Events,
    Physics,
    Processes,
    Entities,
    Render,
}

impl Subsystem {
    pub const ALL: [Subsystem; 5] = [
        Subsystem::Events,
        Subsystem::Physics,
        Subsystem::Processes,
        Subsystem::Entities,
        Subsystem::Render,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Subsystem::Events => "events",
            Subsystem::Physics => "physics",
            Subsystem::Processes => "processes",
            Subsystem::Entities => "entities",
            Subsystem::Render => "render",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-capacity window of the most recent samples.
#[derive(Debug, Clone)]
struct RingBuffer {
    samples: Vec<Duration>,
    capacity: usize,
    index: usize,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            index: 0,
        }
    }

    fn push(&mut self, sample: Duration) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            self.samples[self.index] = sample;
        }
        self.index = (self.index + 1) % self.capacity;
    }

    fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.samples.iter().sum();
        sum / self.samples.len() as u32
    }

    fn min_max(&self) -> (Duration, Duration) {
        let min = self.samples.iter().min().copied().unwrap_or_default();
        let max = self.samples.iter().max().copied().unwrap_or_default();
        (min, max)
    }
}

#[derive(Debug, Clone)]
pub struct FrameStats {
    frame_times: RingBuffer,
    subsystems: [Duration; 5],
    events_dispatched: usize,
    events_deferred: usize,
    frames: u64,
}

impl FrameStats {
    /// Track the last `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            frame_times: RingBuffer::new(capacity),
            subsystems: [Duration::ZERO; 5],
            events_dispatched: 0,
            events_deferred: 0,
            frames: 0,
        }
    }

    pub fn record_frame(&mut self, elapsed: Duration) {
        self.frame_times.push(elapsed);
        self.frames += 1;
    }

    pub fn record(&mut self, subsystem: Subsystem, elapsed: Duration) {
        self.subsystems[subsystem.index()] = elapsed;
    }

    /// Run `f` and record how long it took against `subsystem`.
    pub fn time<F, R>(&mut self, subsystem: Subsystem, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.record(subsystem, start.elapsed());
        result
    }

    pub fn record_events(&mut self, dispatched: usize, deferred: usize) {
        self.events_dispatched = dispatched;
        self.events_deferred = deferred;
    }

    pub fn subsystem_time(&self, subsystem: Subsystem) -> Duration {
        self.subsystems[subsystem.index()]
    }

    #[inline]
    pub fn events_dispatched(&self) -> usize {
        self.events_dispatched
    }

    #[inline]
    pub fn events_deferred(&self) -> usize {
        self.events_deferred
    }

    /// Frames recorded since creation.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn average_frame_time(&self) -> Duration {
        self.frame_times.average()
    }

    pub fn frame_time_ms(&self) -> f64 {
        self.average_frame_time().as_secs_f64() * 1000.0
    }

    pub fn frame_time_range_ms(&self) -> (f64, f64) {
        let (min, max) = self.frame_times.min_max();
        (min.as_secs_f64() * 1000.0, max.as_secs_f64() * 1000.0)
    }

    pub fn fps(&self) -> f64 {
        let avg = self.average_frame_time().as_secs_f64();
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(60)
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} fps ({:.3} ms avg), {} events",
            self.fps(),
            self.frame_time_ms(),
            self.events_dispatched
        )?;
        for subsystem in Subsystem::ALL {
            write!(
                f,
                ", {} {:.3} ms",
                subsystem,
                self.subsystem_time(subsystem).as_secs_f64() * 1000.0
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_average_wraps() {
        let mut stats = FrameStats::new(3);

        stats.record_frame(Duration::from_millis(10));
        assert_eq!(stats.average_frame_time(), Duration::from_millis(10));

        stats.record_frame(Duration::from_millis(20));
        stats.record_frame(Duration::from_millis(30));
        assert_eq!(stats.average_frame_time(), Duration::from_millis(20));

        // oldest sample drops out
        stats.record_frame(Duration::from_millis(40));
        assert_eq!(stats.average_frame_time(), Duration::from_millis(30));
        assert_eq!(stats.frames(), 4);
        assert_eq!(stats.frame_time_range_ms(), (20.0, 40.0));
    }

    #[test]
    fn fps_from_average() {
        let mut stats = FrameStats::new(4);
        assert_eq!(stats.fps(), 0.0);

        stats.record_frame(Duration::from_millis(20));
        stats.record_frame(Duration::from_millis(20));

        assert!((stats.fps() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn subsystem_timings_keep_last_tick() {
        let mut stats = FrameStats::default();

        stats.record(Subsystem::Physics, Duration::from_millis(3));
        stats.record(Subsystem::Physics, Duration::from_millis(1));
        let value = stats.time(Subsystem::Render, || 7);

        assert_eq!(value, 7);
        assert_eq!(stats.subsystem_time(Subsystem::Physics), Duration::from_millis(1));
        assert_eq!(stats.subsystem_time(Subsystem::Events), Duration::ZERO);
    }

    #[test]
    fn display_lists_every_subsystem() {
        let mut stats = FrameStats::default();
        stats.record_events(4, 1);

        let line = stats.to_string();

        assert!(line.contains("4 events"));
        for subsystem in Subsystem::ALL {
            assert!(line.contains(subsystem.name()));
        }
    }
}
