//! Pointer conversions: unchecked, const, checked, and declared upcasts.
//!
//! The free functions mirror the classic `*_pointer_cast` family: each takes
//! a borrowed source and returns a new pointer holding its own unit on the
//! same object (or an empty pointer), leaving the source untouched.

use crate::protocol::{AsAny, RefCounted};
use crate::ptr::IntrusivePtr;
use core::ptr::NonNull;

/// Declares that an `IntrusivePtr<Self>` may become an `IntrusivePtr<U>`,
/// typically with `U = dyn Trait`. Use the [`upcast!`](crate::upcast) macro
/// rather than implementing this by hand.
///
/// # Safety
///
/// `upcast_raw` must return a pointer to the same object, and releasing it
/// through `U::release` must decrement the same count and destroy the object
/// the way `Self::release` would.
pub unsafe trait Upcast<U: ?Sized + RefCounted>: RefCounted {
    fn upcast_raw(ptr: NonNull<Self>) -> NonNull<U>;
}

/// Implements [`Upcast`] from a concrete managed type to one or more trait
/// object types, using the compiler's unsizing coercion.
///
/// ```
/// use intrusive_ptr::{upcast, AsAny, Counted, IntrusivePtr, Shareable};
///
/// trait Signal: Shareable + AsAny {
///     fn power(&self) -> f64;
/// }
///
/// impl Signal for Counted<f64> {
///     fn power(&self) -> f64 {
///         **self
///     }
/// }
///
/// upcast!(Counted<f64> => dyn Signal);
///
/// let p = IntrusivePtr::new(Counted::new(0.25));
/// let s: IntrusivePtr<dyn Signal> = IntrusivePtr::upcast(p.clone());
/// assert_eq!(s.power(), 0.25);
/// assert_eq!(p.use_count(), 2);
/// ```
#[macro_export]
macro_rules! upcast {
    ($from:ty => $($to:ty),+ $(,)?) => {
        $(
            unsafe impl $crate::Upcast<$to> for $from {
                #[inline]
                fn upcast_raw(ptr: ::core::ptr::NonNull<Self>) -> ::core::ptr::NonNull<$to> {
                    ptr
                }
            }
        )+
    };
}

impl<T: ?Sized + RefCounted> IntrusivePtr<T> {
    /// Converting move: the owned unit is carried over, no count change.
    /// Clone first for a converting copy.
    #[inline]
    pub fn upcast<U: ?Sized + RefCounted>(this: Self) -> IntrusivePtr<U>
    where
        T: Upcast<U>,
    {
        // Safety: `Upcast` guarantees same object, same count.
        unsafe { Self::map_raw(this, <T as Upcast<U>>::upcast_raw) }
    }
}

/// Reinterpret the pointee as a `U` without any check, adding one unit.
///
/// # Safety
///
/// The object behind `p` must really be a `U` at the same address, managed
/// under the same count, and destroyable by `U::release`.
#[inline]
pub unsafe fn static_pointer_cast<U, T>(p: &IntrusivePtr<T>) -> IntrusivePtr<U>
where
    U: RefCounted,
    T: ?Sized + RefCounted,
{
    match p.as_ptr() {
        Some(raw) => unsafe { IntrusivePtr::from_raw(raw.cast::<U>()) },
        None => IntrusivePtr::null(),
    }
}

/// Another owner of the same object.
///
/// Pointees are only ever reachable through `&T`, so there is no const
/// qualifier to strip: the result is a plain new unit on the same object.
/// Mutation goes through [`IntrusivePtr::value_mut`] for `Counted<T>`
/// pointees, or the unsafe [`IntrusivePtr::get_mut`].
#[inline]
pub fn const_pointer_cast<T: ?Sized + RefCounted>(p: &IntrusivePtr<T>) -> IntrusivePtr<T> {
    p.clone()
}

/// Checked downcast to the concrete type `U`.
///
/// On success the result holds a new unit on the same object. On a type
/// mismatch, or if `p` is empty, the result is empty and no count changes.
pub fn dynamic_pointer_cast<U, T>(p: &IntrusivePtr<T>) -> IntrusivePtr<U>
where
    U: RefCounted + 'static,
    T: ?Sized + RefCounted + AsAny,
{
    match p.get().and_then(|obj| AsAny::as_any(obj).downcast_ref::<U>()) {
        // Safety: `u` is the object `p` owns, seen through its concrete type.
        Some(u) => unsafe { IntrusivePtr::from_ref(u) },
        None => IntrusivePtr::null(),
    }
}

#[cfg(test)]
mod tests {
    use super::{const_pointer_cast, dynamic_pointer_cast, static_pointer_cast};
    use crate::{AsAny, Counted, IntrusivePtr, Shareable};

    trait Shape: Shareable + AsAny {
        fn sides(&self) -> u32;
    }

    impl Shape for Counted<u32> {
        fn sides(&self) -> u32 {
            **self
        }
    }

    crate::upcast!(Counted<u32> => dyn Shape);

    #[test]
    fn upcast_moves_the_unit() {
        let p = IntrusivePtr::new(Counted::new(3u32));
        let q = p.clone();
        let s: IntrusivePtr<dyn Shape> = IntrusivePtr::upcast(p);
        assert_eq!(s.sides(), 3);
        assert_eq!(q.use_count(), 2);
        assert!(s.ptr_eq(&q));
    }

    #[test]
    fn static_cast_adds_a_unit() {
        let p = IntrusivePtr::new(Counted::new(4u32));
        let s: IntrusivePtr<dyn Shape> = IntrusivePtr::upcast(p.clone());
        let back = unsafe { static_pointer_cast::<Counted<u32>, _>(&s) };
        assert_eq!(back.addr(), p.addr());
        assert_eq!(p.use_count(), 3);
    }

    #[test]
    fn const_cast_adds_a_unit() {
        let p = IntrusivePtr::new(Counted::new(5u32));
        let c = const_pointer_cast(&p);
        assert!(c.ptr_eq(&p));
        assert_eq!(p.use_count(), 2);
    }

    #[test]
    fn dynamic_cast_checks_the_type() {
        let p = IntrusivePtr::new(Counted::new(6u32));
        let s: IntrusivePtr<dyn Shape> = IntrusivePtr::upcast(p.clone());
        let hit = dynamic_pointer_cast::<Counted<u32>, _>(&s);
        assert!(hit.ptr_eq(&p));
        assert_eq!(p.use_count(), 3);
        drop(hit);

        let miss = dynamic_pointer_cast::<Counted<i64>, _>(&s);
        assert!(miss.is_null());
        assert_eq!(p.use_count(), 2);
    }

    #[test]
    fn casts_of_empty_are_empty() {
        let e: IntrusivePtr<dyn Shape> = IntrusivePtr::null();
        assert!(dynamic_pointer_cast::<Counted<u32>, _>(&e).is_null());
        assert!(unsafe { static_pointer_cast::<Counted<u32>, _>(&e) }.is_null());
        assert!(const_pointer_cast(&e).is_null());
        let moved: IntrusivePtr<dyn Shape> =
            IntrusivePtr::upcast(IntrusivePtr::<Counted<u32>>::null());
        assert!(moved.is_null());
    }
}
