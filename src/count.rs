//! Counter cell embedded in every managed object.
//!
//! The count is mutated through `&self` so ownership bookkeeping works while
//! the object itself is only ever observed through shared references.

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;

/// Single-threaded reference counter owned by exactly one managed object.
///
/// Cloning a `RefCount` yields a fresh counter at zero: copying an object
/// never copies its ownership.
pub struct RefCount {
    count: Cell<usize>,
    // !Send + !Sync like Rc
    _nosend: PhantomData<*mut ()>,
}

impl RefCount {
    /// Create a counter with no owners. Const so it can be a field default.
    pub const fn new() -> Self {
        Self {
            count: Cell::new(0),
            _nosend: PhantomData,
        }
    }

    /// Current number of owning pointers.
    #[inline]
    pub fn get(&self) -> usize {
        self.count.get()
    }

    /// Record one more owner.
    ///
    /// # Safety
    ///
    /// Every increment must eventually be balanced by exactly one
    /// `decrement`, normally performed by an `IntrusivePtr` being dropped.
    /// The counter must belong to a heap object whose release path matches
    /// how it was allocated.
    #[inline]
    pub unsafe fn increment(&self) {
        let n = self.count.get().wrapping_add(1);
        self.count.set(n);
        if n == 0 {
            // Follow Rc semantics: abort on overflow rather than continue unsafely.
            std::process::abort();
        }
    }

    /// Drop one owner. Returns true if the count is now zero.
    ///
    /// # Safety
    ///
    /// Must pair with a previous `increment` (or an adopted owner). The
    /// caller is responsible for destroying the object when this returns
    /// true, and must not touch it afterwards.
    #[inline]
    pub unsafe fn decrement(&self) -> bool {
        let c = self.count.get();
        assert!(c > 0, "RefCount underflow");
        let n = c - 1;
        self.count.set(n);
        n == 0
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RefCount {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl fmt::Debug for RefCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefCount").field(&self.count.get()).finish()
    }
}
