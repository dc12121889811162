//! Shareable base: an embedded counter plus the default protocol behavior.

use crate::count::RefCount;
use crate::protocol::RefCounted;
use crate::ptr::IntrusivePtr;
use core::fmt;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

/// A type that embeds its own [`RefCount`].
///
/// Implementing `Shareable` opts the type into [`RefCounted`] through a
/// blanket impl: `add_ref` increments the embedded counter, and `release`
/// decrements it and, on zero, rebuilds the `Box<Self>` with the statically
/// known `Self` and drops it. Concrete types are therefore destroyed as
/// their exact type without any dynamic dispatch. For `dyn Trait` (with
/// `Shareable` as a supertrait) the box drop goes through the vtable.
///
/// ```
/// use intrusive_ptr::{IntrusivePtr, RefCount, Shareable};
///
/// struct Frame {
///     rc: RefCount,
///     bits: u32,
/// }
///
/// unsafe impl Shareable for Frame {
///     fn ref_count(&self) -> &RefCount {
///         &self.rc
///     }
/// }
///
/// let f = IntrusivePtr::new(Frame { rc: RefCount::new(), bits: 127 });
/// let g = f.clone();
/// assert_eq!(g.use_count(), 2);
/// assert_eq!(g.bits, 127);
/// ```
///
/// # Safety
///
/// `ref_count` must always return the same counter, owned by `self` and by
/// no other object.
pub unsafe trait Shareable {
    fn ref_count(&self) -> &RefCount;

    /// Number of `IntrusivePtr`s currently owning `self`.
    #[inline]
    fn count(&self) -> usize {
        self.ref_count().get()
    }

    /// Build a new owning pointer to `self`. See [`shared_from_this`].
    fn shared_from_this(&self) -> IntrusivePtr<Self>
    where
        Self: Sized,
    {
        shared_from_this(self)
    }
}

/// Build a new owning pointer to an object already owned elsewhere.
///
/// Works for unsized managed types such as `dyn Trait`, which cannot call
/// the `Shareable::shared_from_this` method.
///
/// Panics if `obj` has no owner: an object that was never wrapped in an
/// `IntrusivePtr` is not known to live on the heap.
pub fn shared_from_this<T: ?Sized + Shareable>(obj: &T) -> IntrusivePtr<T> {
    assert!(
        obj.ref_count().get() > 0,
        "shared_from_this called on an object with no owning IntrusivePtr"
    );
    // Safety: a non-zero count means some IntrusivePtr owns `obj`, so it
    // was allocated the way the blanket `release` expects.
    unsafe { IntrusivePtr::from_ref(obj) }
}

unsafe impl<T: ?Sized + Shareable> RefCounted for T {
    #[inline]
    unsafe fn add_ref(&self) {
        unsafe { self.ref_count().increment() }
    }

    #[inline]
    unsafe fn release(this: NonNull<Self>) {
        let last = unsafe { this.as_ref().ref_count().decrement() };
        if last {
            unsafe { destroy(this) };
        }
    }

    #[inline]
    fn use_count(&self) -> usize {
        self.ref_count().get()
    }
}

/// # Safety
///
/// `this` must have been leaked from a `Box<T>` and have no owner left.
#[cold]
#[inline(never)]
unsafe fn destroy<T: ?Sized>(this: NonNull<T>) {
    #[cfg(feature = "tracing")]
    tracing::trace!(
        target: "intrusive_ptr",
        ty = core::any::type_name::<T>(),
        addr = ?this.cast::<()>(),
        "last reference released; destroying object"
    );
    // Safety: as per pre-condition; every object reaching the blanket release
    // was leaked from a `Box` by `IntrusivePtr::new`.
    drop(unsafe { Box::from_raw(this.as_ptr()) });
}

/// A value paired with its own counter: the quickest way to manage a type
/// that has no `RefCount` field of its own.
///
/// Cloning a `Counted` clones the value and starts the copy at zero owners.
pub struct Counted<T: ?Sized> {
    refcount: RefCount,
    value: T,
}

impl<T> Counted<T> {
    pub const fn new(value: T) -> Self {
        Self {
            refcount: RefCount::new(),
            value,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

unsafe impl<T: ?Sized> Shareable for Counted<T> {
    #[inline]
    fn ref_count(&self) -> &RefCount {
        &self.refcount
    }
}

impl<T: ?Sized> IntrusivePtr<Counted<T>> {
    /// Exclusive access to the wrapped value when this is the only owner.
    /// The counter itself stays out of reach.
    pub fn value_mut(&mut self) -> Option<&mut T> {
        // Safety: only the value is handed out, so the object and its
        // counter cannot be moved or replaced.
        unsafe { self.get_mut() }.map(|c| &mut c.value)
    }
}

impl<T: Clone> IntrusivePtr<Counted<T>> {
    /// Clone-on-write access to the wrapped value.
    ///
    /// Panics if the pointer is empty.
    pub fn make_value_mut(&mut self) -> &mut T {
        // Safety: as in `value_mut`.
        unsafe { &mut self.make_mut().value }
    }
}

impl<T: ?Sized> Deref for Counted<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: ?Sized> DerefMut for Counted<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Clone> Clone for Counted<T> {
    fn clone(&self) -> Self {
        Self {
            refcount: self.refcount.clone(),
            value: self.value.clone(),
        }
    }
}

impl<T: Default> Default for Counted<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Counted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counted")
            .field("refcount", &self.refcount)
            .field("value", &&self.value)
            .finish()
    }
}
