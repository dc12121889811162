//! Customization points through which every `IntrusivePtr` operation flows.

use core::any::Any;
use core::ptr::NonNull;

/// The capability set {add-ref, release} of a managed type.
///
/// Resolved statically against the pointer's pointee type: an
/// `IntrusivePtr<T>` always calls `T::add_ref` and `T::release`, never a
/// dynamically chosen implementation (unless `T` is itself a trait object).
///
/// Most types get this through the blanket impl for [`Shareable`]. Implement
/// it directly when the type keeps its count elsewhere or disposes of itself
/// in a non-standard way.
///
/// # Safety
///
/// Implementors guarantee that:
/// - each object has exactly one count, shared by all of its owners;
/// - `use_count` reports the number of outstanding `add_ref`s (including
///   adopted owners) not yet matched by a `release`;
/// - `release` destroys the object exactly once, when the count reaches
///   zero, and never before.
///
/// [`Shareable`]: crate::Shareable
pub unsafe trait RefCounted {
    /// Record one more owner of `self`.
    ///
    /// # Safety
    ///
    /// `self` must be a heap object that `release` knows how to destroy, and
    /// the new owner must eventually be released exactly once.
    unsafe fn add_ref(&self);

    /// Drop one owner of `*this`; destroy the object if it was the last one.
    ///
    /// # Safety
    ///
    /// `this` must point to a live object with at least one owner, and the
    /// caller must hold one of those ownership units. The object may be
    /// freed by this call.
    unsafe fn release(this: NonNull<Self>);

    /// Number of owners currently recorded for `self`.
    fn use_count(&self) -> usize;
}

/// Access to the concrete type behind a (possibly unsized) managed type.
///
/// Blanket-implemented for every `'static` sized type; put it as a
/// supertrait of a trait to make `dyn Trait` pointers downcastable.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}
