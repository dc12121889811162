//! intrusive-ptr: a single-threaded shared-ownership pointer whose
//! reference count lives inside the managed object itself.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: value-like handles (copy, move, drop) to heap objects that are
//!   queued, copied and discarded by an event-driven consumer, with the
//!   object destroyed exactly once when the last handle goes away.
//! - Layers:
//!   - RefCount: the counter cell embedded in each managed object;
//!     mutable through `&self`, reset to zero when the object is cloned.
//!   - RefCounted: the {add_ref, release} customization points, resolved
//!     statically per pointee type.
//!   - Shareable: the reusable base. Any type exposing an embedded
//!     `RefCount` gets `RefCounted` through a blanket impl whose release
//!     destroys the object as its exact static type. `Counted<T>` pairs
//!     any value with a counter.
//!   - IntrusivePtr<T>: the nullable owning handle. Every construction,
//!     clone, assignment and drop goes through `RefCounted`.
//!   - Casts: unchecked (`static_pointer_cast`), const
//!     (`const_pointer_cast`), checked (`dynamic_pointer_cast`,
//!     `IntrusivePtr::downcast`) and declared upcasts (`upcast!`).
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` by design (no atomics).
//! - No control block: the only allocation is the object itself.
//! - Identity semantics: equality, ordering and hashing use the address,
//!   never the pointee's value. Ordering is stable within one process run.
//! - Precondition violations (dereferencing an empty pointer, asking an
//!   unowned object for `shared_from_this`) panic.
//!
//! Polymorphic release
//! - The blanket release for `Shareable` types is monomorphized per
//!   pointee type, so a concrete object is destroyed as that type without a
//!   vtable. Pointers to `dyn Trait` (with `Shareable` as a supertrait) fall
//!   back to the vtable's drop glue.
//!
//! Overflow semantics
//! - Incrementing a count past `usize::MAX` aborts the process, matching
//!   `Rc`. Decrementing below zero is a protocol violation and panics.
//! - A `&mut` to a managed object would let safe code move its counter, so
//!   `get_mut`/`make_mut` are unsafe. `Counted<T>` pointees get safe
//!   `value_mut`/`make_value_mut`, which reach only the wrapped value.
//!
//! Notes and non-goals
//! - Teardown is recursive: dropping the last pointer to an object that
//!   owns further pointers releases them synchronously, so very deep
//!   ownership chains use stack proportional to their depth.
//! - No weak handles, no cycle collection, no custom allocators.
//! - `detach` is an escape hatch: the caller owes one release, normally
//!   paid back with `IntrusivePtr::from_raw_adopted`.
//!
//! Logging
//! - With the `tracing` feature, the default release path emits a
//!   `trace!` event (target `intrusive_ptr`) for each destroyed object.

//  Ensure unsafe operations are duly checked.
#![deny(unsafe_op_in_unsafe_fn)]

mod cast;
mod count;
mod protocol;
mod ptr;
mod shareable;

// Public surface
pub use cast::{const_pointer_cast, dynamic_pointer_cast, static_pointer_cast, Upcast};
pub use count::RefCount;
pub use protocol::{AsAny, RefCounted};
pub use ptr::IntrusivePtr;
pub use shareable::{shared_from_this, Counted, Shareable};
