//! Render target without a window
//!
//! Counts frames and draw calls. Used by the runtime when no display backend
//! is attached, and by drawables that want to report what they drew.

use cinder_core::entity::RenderTarget;
use glam::Affine2;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct HeadlessTarget {
    frames: u64,
    draws_this_frame: usize,
    total_draws: u64,
    transform: Affine2,
}

impl HeadlessTarget {
    pub fn new() -> Self {
        Self {
            frames: 0,
            draws_this_frame: 0,
            total_draws: 0,
            transform: Affine2::IDENTITY,
        }
    }

    /// Called by drawables for every primitive they emit.
    pub fn record_draw(&mut self) {
        self.draws_this_frame += 1;
        self.total_draws += 1;
    }

    /// Frames presented so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn draws_this_frame(&self) -> usize {
        self.draws_this_frame
    }

    #[inline]
    pub fn total_draws(&self) -> u64 {
        self.total_draws
    }

    /// The transform most recently set by the render manager.
    #[inline]
    pub fn transform(&self) -> Affine2 {
        self.transform
    }
}

impl Default for HeadlessTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTarget for HeadlessTarget {
    fn clear(&mut self) {
        self.draws_this_frame = 0;
        self.transform = Affine2::IDENTITY;
    }

    fn set_transform(&mut self, transform: Affine2) {
        self.transform = transform;
    }

    fn present(&mut self) {
        self.frames += 1;
        trace!(
            "Presented frame {} with {} draws",
            self.frames,
            self.draws_this_frame
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_core::as_any::AsAny;
    use glam::Vec2;

    #[test]
    fn counts_draws_per_frame() {
        let mut target = HeadlessTarget::new();

        target.clear();
        target.record_draw();
        target.record_draw();
        target.present();
        target.clear();
        target.record_draw();
        target.present();

        assert_eq!(target.frames(), 2);
        assert_eq!(target.draws_this_frame(), 1);
        assert_eq!(target.total_draws(), 3);
    }

    #[test]
    fn reachable_through_trait_object() {
        let mut target = HeadlessTarget::new();
        let dynamic: &mut dyn RenderTarget = &mut target;

        dynamic.set_transform(Affine2::from_translation(Vec2::new(1.0, 2.0)));
        if let Some(headless) = dynamic.as_any_mut().downcast_mut::<HeadlessTarget>() {
            headless.record_draw();
        }

        assert_eq!(target.total_draws(), 1);
        assert_eq!(target.transform().translation, Vec2::new(1.0, 2.0));
    }
}
