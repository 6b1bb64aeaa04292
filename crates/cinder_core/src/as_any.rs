use std::any::Any;

/// Upcast helper so trait objects can be downcast to their concrete type.
///
/// Implemented for every `'static` type. Call it through a deref of the trait
/// object (`(*boxed).as_any()`), otherwise the `Box` itself is upcast.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
