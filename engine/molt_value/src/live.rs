//! Shared mutable cell with stable identity.
//!
//! Everything the engine can swap out from under running code lives in a
//! `Live<T>`: record fields, behavior tables, handle targets. The cell
//! keeps its identity across swaps, which is the whole trick behind
//! replacing code without invalidating references to it.

// Rc is the intentional implementation detail of Live<T>
#![expect(
    clippy::disallowed_types,
    reason = "Rc is the implementation of Live<T>"
)]

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// A single-threaded shared cell with reference-counted interior mutability.
///
/// This type wraps `Rc<RefCell<T>>` and enforces that all shared-cell
/// allocations go through the `Live::new()` factory method.
///
/// # Identity
/// Clones share the same cell. [`Live::same`] compares cell identity, not
/// contents; the engine uses that identity to decide whether two references
/// observe the same live state.
///
/// # Thread Safety
/// `Live<T>` is NOT thread-safe. It uses `Rc` internally, which is faster
/// than `Arc` but cannot be shared across threads. Module evaluation and
/// migration run single-threaded, so nothing here needs to be `Send`.
#[repr(transparent)]
pub struct Live<T>(Rc<RefCell<T>>);

impl<T> Live<T> {
    /// Create a new `Live` cell wrapping the given value.
    #[inline]
    pub fn new(value: T) -> Self {
        Live(Rc::new(RefCell::new(value)))
    }

    /// Borrow the inner value immutably.
    #[inline]
    pub fn borrow(&self) -> std::cell::Ref<'_, T> {
        self.0.borrow()
    }

    /// Borrow the inner value mutably.
    #[inline]
    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Whether two handles refer to the same cell.
    #[inline]
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for Live<T> {
    #[inline]
    fn clone(&self) -> Self {
        Live(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for Live<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Live").field(&self.0).finish()
    }
}

impl<T: Default> Default for Live<T> {
    fn default() -> Self {
        Live::new(T::default())
    }
}

impl<T> Deref for Live<T> {
    type Target = RefCell<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let a = Live::new(1);
        let b = a.clone();
        *b.borrow_mut() = 2;
        assert_eq!(*a.borrow(), 2);
    }

    #[test]
    fn test_same_is_identity_not_equality() {
        let a = Live::new(7);
        let b = Live::new(7);
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
    }
}
