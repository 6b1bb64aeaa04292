//! Physics boundary
//!
//! The core does not simulate anything itself. A [`PhysicsWorld`] supplied by
//! the game is stepped at a fixed rate by the [`PhysicsManager`], with
//! observers notified around every sub-step.

use crate::observer::{ObserverId, Observers};
use crate::time::{FixedStep, TICK_RATE_HZ};
use tracing::trace;

/// A physics simulation stepped by the engine.
pub trait PhysicsWorld {
    fn step(&mut self, dt: f32);

    /// Reset accumulated forces after a step.
    fn clear_forces(&mut self) {}
}

/// Steps a [`PhysicsWorld`] in fixed increments.
#[derive(Debug)]
pub struct PhysicsManager<W> {
    world: W,
    step: FixedStep,
    paused: bool,
    pre_step: Observers<f32>,
    post_step: Observers<f32>,
}

impl<W: PhysicsWorld> PhysicsManager<W> {
    pub fn new(world: W) -> Self {
        Self::with_rate(world, TICK_RATE_HZ)
    }

    pub fn with_rate(world: W, hz: u32) -> Self {
        Self {
            world,
            step: FixedStep::from_rate(hz),
            paused: false,
            pre_step: Observers::new(),
            post_step: Observers::new(),
        }
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Seconds per sub-step.
    pub fn step_interval(&self) -> f32 {
        self.step.interval()
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Called with the step interval before each sub-step.
    pub fn on_pre_step<F>(&mut self, callback: F) -> ObserverId
    where
        F: FnMut(&f32) + 'static,
    {
        self.pre_step.subscribe(callback)
    }

    /// Called with the step interval after each sub-step.
    pub fn on_post_step<F>(&mut self, callback: F) -> ObserverId
    where
        F: FnMut(&f32) + 'static,
    {
        self.post_step.subscribe(callback)
    }

    pub fn remove_step_observer(&mut self, id: ObserverId) -> bool {
        self.pre_step.unsubscribe(id) || self.post_step.unsubscribe(id)
    }

    /// Run as many whole sub-steps as `delta` (plus carry-over) covers.
    /// Returns the number of sub-steps taken.
    pub fn update(&mut self, delta: f32) -> u32 {
        if self.paused {
            return 0;
        }

        self.step.accumulate(delta);
        let dt = self.step.interval();
        let mut steps = 0;
        while self.step.next_step() {
            self.pre_step.notify(&dt);
            self.world.step(dt);
            self.world.clear_forces();
            self.post_step.notify(&dt);
            steps += 1;
        }

        if steps > 1 {
            trace!("Physics ran {} sub-steps", steps);
        }
        steps
    }

    pub fn shutdown(&mut self) {
        self.pre_step.clear();
        self.post_step.clear();
        self.step.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        steps: Vec<f32>,
        clears: u32,
    }

    impl PhysicsWorld for Recorder {
        fn step(&mut self, dt: f32) {
            self.steps.push(dt);
        }
        fn clear_forces(&mut self) {
            self.clears += 1;
        }
    }

    #[test]
    fn update_runs_whole_steps() {
        let mut physics = PhysicsManager::with_rate(Recorder::default(), 10);

        assert_eq!(physics.update(0.25), 2);
        assert_eq!(physics.update(0.1), 1);

        assert_eq!(physics.world().steps.len(), 3);
        assert_eq!(physics.world().clears, 3);
    }

    #[test]
    fn observers_wrap_each_step() {
        let mut physics = PhysicsManager::with_rate(Recorder::default(), 10);
        let log = Rc::new(RefCell::new(Vec::new()));
        let pre = Rc::clone(&log);
        physics.on_pre_step(move |_| pre.borrow_mut().push("pre"));
        let post = Rc::clone(&log);
        physics.on_post_step(move |_| post.borrow_mut().push("post"));

        physics.update(0.25);

        assert_eq!(*log.borrow(), vec!["pre", "post", "pre", "post"]);
    }

    #[test]
    fn paused_physics_does_not_accumulate() {
        let mut physics = PhysicsManager::with_rate(Recorder::default(), 10);
        physics.set_paused(true);

        assert_eq!(physics.update(1.0), 0);
        physics.set_paused(false);
        assert_eq!(physics.update(0.0), 0);
        assert!(physics.world().steps.is_empty());
    }
}
