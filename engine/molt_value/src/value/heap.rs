//! Heap wrapper for enforced shared allocation.
//!
//! The `Heap<T>` type wraps `Rc<T>` and provides the ONLY way to allocate
//! immutable heap values in the Value system. External code cannot call
//! `Heap::new()` directly since the constructor is `pub(super)` (visible
//! only within the value module), so all heap allocations go through
//! `Value`'s factory methods.

// Rc is the intentional implementation detail of Heap<T>
#![expect(clippy::disallowed_types, reason = "Rc is the whole point of Heap<T>")]

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

/// A heap-allocated immutable value wrapper.
///
/// External code must use `Value::string()` and friends rather than
/// constructing one of these directly.
///
/// # Thread Safety
/// Uses `Rc` internally; the engine and every value it manages stay on one
/// thread.
#[repr(transparent)]
pub struct Heap<T: ?Sized>(Rc<T>);

impl<T> Heap<T> {
    /// Create a new heap-allocated value.
    ///
    /// This is `pub(super)` - only visible within the value module.
    #[inline]
    pub(super) fn new(value: T) -> Self {
        Heap(Rc::new(value))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(Rc::clone(&self.0))
    }
}

impl<T: ?Sized + PartialEq> PartialEq for Heap<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl<T: ?Sized + Eq> Eq for Heap<T> {}

impl<T: ?Sized + Hash> Hash for Heap<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        (*self.0).hash(state);
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
