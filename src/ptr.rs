//! `IntrusivePtr`: the owning, nullable handle to a managed object.
//!
//! Every path that creates or destroys an owning handle goes through the
//! pointee's [`RefCounted`] impl. Assignments follow the "build the new
//! state, then replace" order: in `*p = q.clone()` the clone takes its unit
//! before the old value of `*p` releases its own, so self-assignment and
//! assignment between aliases never drop the count to zero in between.

use crate::protocol::{AsAny, RefCounted};
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::mem;
use core::ops::Deref;
use core::ptr::NonNull;

/// A shared-ownership pointer whose count lives inside the pointee.
///
/// Either empty or owning exactly one unit of the pointee's count. Unlike
/// `Rc`, the pointer can be rebuilt from a plain `&T` (see
/// [`IntrusivePtr::from_ref`]) because the object carries its own count.
///
/// Single-threaded: `!Send` and `!Sync`.
pub struct IntrusivePtr<T: ?Sized + RefCounted> {
    ptr: Option<NonNull<T>>,
    // Owns a T for drop-check purposes; NonNull already makes this !Send + !Sync.
    _owns: PhantomData<T>,
}

impl<T: RefCounted> IntrusivePtr<T> {
    /// Move `value` to the heap and take the first ownership unit.
    ///
    /// The pointee's release path must destroy it as a `Box<T>`, which is
    /// what the default [`Shareable`](crate::Shareable) release does.
    pub fn new(value: T) -> Self {
        let raw = NonNull::from(Box::leak(Box::new(value)));
        // Safety: freshly boxed; the unit taken here is released on drop.
        unsafe { Self::from_raw(raw) }
    }
}

impl<T: ?Sized + RefCounted> IntrusivePtr<T> {
    /// The empty pointer. No side effect.
    #[inline]
    pub const fn null() -> Self {
        Self {
            ptr: None,
            _owns: PhantomData,
        }
    }

    /// Take a new ownership unit on the object at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live managed object whose `release` matches how
    /// it was allocated.
    #[inline]
    pub unsafe fn from_raw(ptr: NonNull<T>) -> Self {
        unsafe { ptr.as_ref().add_ref() };
        unsafe { Self::from_raw_adopted(ptr) }
    }

    /// Wrap `ptr` without touching its count: the count must already include
    /// the unit this pointer now owns (e.g. from [`detach`](Self::detach)).
    ///
    /// # Safety
    ///
    /// Same as [`from_raw`](Self::from_raw), and the caller transfers one
    /// ownership unit it holds to the returned pointer.
    #[inline]
    pub unsafe fn from_raw_adopted(ptr: NonNull<T>) -> Self {
        Self {
            ptr: Some(ptr),
            _owns: PhantomData,
        }
    }

    /// Take a new ownership unit on an object reached through a reference.
    ///
    /// # Safety
    ///
    /// `obj` must be a managed object that `T::release` can destroy, which
    /// in practice means some `IntrusivePtr` already owns it.
    #[inline]
    pub unsafe fn from_ref(obj: &T) -> Self {
        unsafe { Self::from_raw(NonNull::from(obj)) }
    }

    /// True iff the pointer owns an object.
    #[inline]
    pub fn is_some(&self) -> bool {
        self.ptr.is_some()
    }

    /// True iff the pointer is empty.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// The raw address, without affecting the count.
    #[inline]
    pub fn as_ptr(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    /// Borrow the pointee, or `None` when empty.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        // Safety: an owning pointer keeps its pointee alive for as long as
        // the borrow of `self` lasts.
        self.ptr.map(|p| unsafe { &*p.as_ptr() })
    }

    /// Exclusive access to the pointee when this is its only owner.
    ///
    /// For `Counted<T>` pointees, [`value_mut`](Self::value_mut) is the safe
    /// alternative.
    ///
    /// # Safety
    ///
    /// The returned reference covers the embedded counter too. The caller
    /// must not move, replace or swap the object (or its counter) through it.
    pub unsafe fn get_mut(&mut self) -> Option<&mut T> {
        let p = self.ptr?;
        // Safety: with a single owner, no other handle can observe the
        // object while `self` is mutably borrowed.
        unsafe {
            if p.as_ref().use_count() == 1 {
                Some(&mut *p.as_ptr())
            } else {
                None
            }
        }
    }

    /// Thin address of the pointee, 0 when empty. Used for identity
    /// comparison, ordering and hashing.
    #[inline]
    pub fn addr(&self) -> usize {
        self.ptr.map_or(0, |p| p.cast::<()>().as_ptr() as usize)
    }

    /// Number of owners of the pointee.
    ///
    /// Panics if the pointer is empty.
    #[inline]
    pub fn use_count(&self) -> usize {
        self.get()
            .expect("use_count called on an empty IntrusivePtr")
            .use_count()
    }

    /// True iff both pointers refer to the same object (or are both empty).
    #[inline]
    pub fn ptr_eq<U: ?Sized + RefCounted>(&self, other: &IntrusivePtr<U>) -> bool {
        self.addr() == other.addr()
    }

    /// Release the owned unit, if any, and become empty.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::null();
    }

    /// Point at `ptr`, taking a new unit; the previously owned unit is
    /// released only after the new one is taken.
    ///
    /// # Safety
    ///
    /// Same as [`from_raw`](Self::from_raw).
    #[inline]
    pub unsafe fn reset_raw(&mut self, ptr: NonNull<T>) {
        *self = unsafe { Self::from_raw(ptr) };
    }

    /// Point at `ptr`, adopting a unit the caller already holds.
    ///
    /// # Safety
    ///
    /// Same as [`from_raw_adopted`](Self::from_raw_adopted).
    #[inline]
    pub unsafe fn reset_raw_adopted(&mut self, ptr: NonNull<T>) {
        *self = unsafe { Self::from_raw_adopted(ptr) };
    }

    /// Copy-assign from `other`: take a unit on its object, then release the
    /// old one. Correct when `other` aliases `self`'s object.
    #[inline]
    pub fn assign(&mut self, other: &Self) {
        *self = other.clone();
    }

    /// Move the contents out, leaving `self` empty. No count change.
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::null())
    }

    /// Exchange pointees with `other`. No count change.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.ptr, &mut other.ptr);
    }

    /// Give up ownership without releasing: `self` becomes empty and the
    /// caller now owes exactly one release for the returned address,
    /// typically through [`from_raw_adopted`](Self::from_raw_adopted).
    #[inline]
    pub fn detach(&mut self) -> Option<NonNull<T>> {
        self.ptr.take()
    }

    /// Consuming variant of [`detach`](Self::detach).
    #[inline]
    pub fn into_raw(mut this: Self) -> Option<NonNull<T>> {
        this.detach()
    }

    /// Reinterpret the owned unit as belonging to an `IntrusivePtr<U>`.
    ///
    /// # Safety
    ///
    /// `f` must return a pointer to the same object, and `U::release` must be
    /// able to destroy it.
    #[inline]
    pub(crate) unsafe fn map_raw<U: ?Sized + RefCounted>(
        this: Self,
        f: impl FnOnce(NonNull<T>) -> NonNull<U>,
    ) -> IntrusivePtr<U> {
        match Self::into_raw(this) {
            Some(p) => unsafe { IntrusivePtr::from_raw_adopted(f(p)) },
            None => IntrusivePtr::null(),
        }
    }
}

impl<T: ?Sized + RefCounted + AsAny> IntrusivePtr<T> {
    /// Checked, consuming downcast. The owned unit moves to the result on
    /// success; on failure the original pointer is handed back unchanged.
    pub fn downcast<U: RefCounted + 'static>(this: Self) -> Result<IntrusivePtr<U>, Self> {
        let is_u = match this.get() {
            Some(obj) => AsAny::as_any(obj).is::<U>(),
            None => false,
        };
        if is_u {
            // Safety: the runtime check proved the object is a `U` at the
            // same address.
            Ok(unsafe { Self::map_raw(this, NonNull::cast::<U>) })
        } else {
            Err(this)
        }
    }
}

impl<T: RefCounted + Clone> IntrusivePtr<T> {
    /// Clone-on-write access: if other owners exist, replace the pointee
    /// with a private clone first (the clone starts with a fresh count).
    ///
    /// Panics if the pointer is empty.
    ///
    /// # Safety
    ///
    /// Same as [`get_mut`](Self::get_mut): the object must stay in place.
    pub unsafe fn make_mut(&mut self) -> &mut T {
        let obj = self.get().expect("make_mut called on an empty IntrusivePtr");
        if obj.use_count() != 1 {
            *self = Self::new(obj.clone());
        }
        let p = self
            .ptr
            .expect("pointer is non-empty after clone-on-write");
        // Safety: `self` is now the only owner.
        unsafe { &mut *p.as_ptr() }
    }
}

impl<T: ?Sized + RefCounted> Clone for IntrusivePtr<T> {
    #[inline]
    fn clone(&self) -> Self {
        match self.ptr {
            // Safety: `self` keeps the object alive; the new unit is
            // released by the clone's drop.
            Some(p) => unsafe { Self::from_raw(p) },
            None => Self::null(),
        }
    }
}

impl<T: ?Sized + RefCounted> Drop for IntrusivePtr<T> {
    #[inline]
    fn drop(&mut self) {
        if let Some(p) = self.ptr.take() {
            // Safety: `self` owned exactly one unit on `p`.
            unsafe { T::release(p) }
        }
    }
}

impl<T: ?Sized + RefCounted> Default for IntrusivePtr<T> {
    #[inline]
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized + RefCounted> Deref for IntrusivePtr<T> {
    type Target = T;

    /// Panics if the pointer is empty.
    #[inline]
    fn deref(&self) -> &T {
        self.get().expect("dereferenced an empty IntrusivePtr")
    }
}

impl<T: ?Sized + RefCounted> AsRef<T> for IntrusivePtr<T> {
    #[inline]
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T: RefCounted> From<T> for IntrusivePtr<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

//
//  Identity comparison
//

impl<T, U> PartialEq<IntrusivePtr<U>> for IntrusivePtr<T>
where
    T: ?Sized + RefCounted,
    U: ?Sized + RefCounted,
{
    #[inline]
    fn eq(&self, other: &IntrusivePtr<U>) -> bool {
        self.addr() == other.addr()
    }
}

impl<T: ?Sized + RefCounted> Eq for IntrusivePtr<T> {}

impl<T: ?Sized + RefCounted, U: ?Sized> PartialEq<*const U> for IntrusivePtr<T> {
    #[inline]
    fn eq(&self, other: &*const U) -> bool {
        self.addr() == other.cast::<()>() as usize
    }
}

impl<T: ?Sized + RefCounted, U: ?Sized> PartialEq<IntrusivePtr<T>> for *const U {
    #[inline]
    fn eq(&self, other: &IntrusivePtr<T>) -> bool {
        other == self
    }
}

impl<T: ?Sized + RefCounted> PartialOrd for IntrusivePtr<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders by address: stable within one process run only.
impl<T: ?Sized + RefCounted> Ord for IntrusivePtr<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl<T: ?Sized + RefCounted> Hash for IntrusivePtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

//
//  Formatting
//

impl<T: ?Sized + RefCounted> fmt::Pointer for IntrusivePtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&(self.addr() as *const ()), f)
    }
}

impl<T: ?Sized + RefCounted> fmt::Display for IntrusivePtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(self, f)
    }
}

impl<T: ?Sized + RefCounted> fmt::Debug for IntrusivePtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IntrusivePtr(")?;
        fmt::Pointer::fmt(self, f)?;
        f.write_str(")")
    }
}
