//! Component capabilities
//!
//! A capability is a role a component may play regardless of its concrete
//! type: providing the entity's transform, or being drawable. Components opt
//! in through the `as_*` accessors on [`Component`]; callers query them with
//! [`Entity::components_by_capability`](crate::entity::Entity::components_by_capability).

use crate::as_any::AsAny;
use crate::entity::Component;
use glam::{Affine2, Vec2};

/// Selects the components of an entity that expose some role.
///
/// Implement this for custom roles by downcasting through `as_any()`:
///
/// ```ignore
/// struct Sensors;
/// impl Capability for Sensors {
///     type Target = dyn Sensor;
///     fn query(component: &dyn Component) -> Option<&Self::Target> {
///         component.as_any().downcast_ref::<Radar>().map(|r| r as &dyn Sensor)
///     }
/// }
/// ```
pub trait Capability {
    type Target: ?Sized;

    fn query(component: &dyn Component) -> Option<&Self::Target>;
}

/// Components that provide the entity transform. At most one per entity.
pub struct TransformCapability;

impl Capability for TransformCapability {
    type Target = dyn Transform;

    fn query(component: &dyn Component) -> Option<&Self::Target> {
        component.as_transform()
    }
}

/// Components the render collaborator draws.
pub struct DrawableCapability;

impl Capability for DrawableCapability {
    type Target = dyn Drawable;

    fn query(component: &dyn Component) -> Option<&Self::Target> {
        component.as_drawable()
    }
}

/// Position and rotation of an entity in world space.
///
/// The backing storage is up to the implementation; a physics-driven
/// transform can read and write an external rigid body.
pub trait Transform {
    fn position(&self) -> Vec2;

    fn set_position(&mut self, position: Vec2);

    /// Rotation in radians.
    fn rotation(&self) -> f32;

    fn set_rotation(&mut self, radians: f32);

    fn translate(&mut self, offset: Vec2) {
        let position = self.position();
        self.set_position(position + offset);
    }

    fn rotate(&mut self, radians: f32) {
        let rotation = self.rotation();
        self.set_rotation(rotation + radians);
    }

    fn rotate_degrees(&mut self, degrees: f32) {
        self.rotate(degrees.to_radians());
    }

    /// Rotation followed by translation.
    fn matrix(&self) -> Affine2 {
        Affine2::from_angle_translation(self.rotation(), self.position())
    }
}

/// Well-known render depths. Larger depths are drawn first.
pub struct RenderDepth;

impl RenderDepth {
    pub const DEFAULT: i32 = 0;
    pub const GUI: i32 = 1;
    pub const DEBUG_OVERLAY: i32 = 100;
    pub const VEHICLE: i32 = 10_000;
    pub const PROJECTILE: i32 = 15_000;
    pub const TERRAIN: i32 = 20_000;
}

/// Opaque drawing surface handed to drawables.
///
/// Backends downcast through `as_any_mut()` to reach their own API.
pub trait RenderTarget: AsAny {
    fn clear(&mut self) {}

    /// Transform of the entity about to be drawn.
    fn set_transform(&mut self, _transform: Affine2) {}

    fn present(&mut self) {}
}

/// A component that can draw itself.
pub trait Drawable {
    fn render_depth(&self) -> i32 {
        RenderDepth::DEFAULT
    }

    fn drawing_enabled(&self) -> bool {
        true
    }

    fn draw(&self, target: &mut dyn RenderTarget);
}
