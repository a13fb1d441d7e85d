//! String interner backing the engine's name space.
//!
//! Interned strings are leaked and live for the process lifetime, which is
//! what a live-replacement session wants anyway: names from retired module
//! versions stay resolvable for as long as anything can still log them.

// Arc is needed here for SharedInterner - the interner is shared between the
// engine and any host-side instrumentation that mints names on its own.
#![expect(
    clippy::disallowed_types,
    reason = "Arc required for SharedInterner handles"
)]

use crate::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// Table exceeded capacity (over 4 billion strings).
    TableOverflow { count: usize },
}

impl std::fmt::Display for InternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternError::TableOverflow { count } => write!(
                f,
                "interner exceeded capacity: {} strings (0x{:X}), max is {} (0x{:X})",
                count,
                count,
                u32::MAX,
                u32::MAX
            ),
        }
    }
}

impl std::error::Error for InternError {}

/// Append-only table mapping string contents to [`Name`] ids.
struct InternTable {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents, indexed by `Name`.
    strings: Vec<&'static str>,
}

impl InternTable {
    fn with_empty() -> Self {
        // Pre-intern empty string at index 0 so Name::EMPTY always resolves
        let empty: &'static str = "";
        let mut map = FxHashMap::default();
        map.insert(empty, 0);
        Self {
            map,
            strings: vec![empty],
        }
    }
}

/// String interner with O(1) lookup and equality comparison.
///
/// Uses an `RwLock` so a `SharedInterner` can be handed to host code without
/// restricting where names get minted.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    /// Create a new interner with the empty string pre-interned.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(InternTable::with_empty()),
        }
    }

    /// Try to intern a string, returning its Name or an error on overflow.
    ///
    /// This is the fallible version of `intern()`. Use this when you need to
    /// handle the overflow case gracefully instead of panicking.
    #[inline]
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        // Fast path: check if already interned
        {
            let guard = self.table.read();
            if let Some(&index) = guard.map.get(s) {
                return Ok(Name::from_raw(index));
            }
        }

        let mut guard = self.table.write();

        // Double-check after acquiring write lock
        if let Some(&index) = guard.map.get(s) {
            return Ok(Name::from_raw(index));
        }

        // Leak the string to get 'static lifetime
        let owned: String = s.to_owned();
        let leaked: &'static str = Box::leak(owned.into_boxed_str());

        let index = u32::try_from(guard.strings.len()).map_err(|_| InternError::TableOverflow {
            count: guard.strings.len(),
        })?;
        guard.strings.push(leaked);
        guard.map.insert(leaked, index);

        Ok(Name::from_raw(index))
    }

    /// Intern a string, returning its Name.
    ///
    /// # Panics
    /// Panics if the interner exceeds capacity (over 4 billion strings).
    /// Use `try_intern` for fallible interning.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Intern an owned String, avoiding double allocation.
    ///
    /// # Panics
    /// Panics if the interner exceeds capacity (over 4 billion strings).
    pub fn intern_owned(&self, s: String) -> Name {
        // Fast path: check if already interned
        {
            let guard = self.table.read();
            if let Some(&index) = guard.map.get(s.as_str()) {
                return Name::from_raw(index);
            }
        }

        let mut guard = self.table.write();

        if let Some(&index) = guard.map.get(s.as_str()) {
            return Name::from_raw(index);
        }

        // Leak the owned string directly (no extra allocation)
        let leaked: &'static str = Box::leak(s.into_boxed_str());

        let index = match u32::try_from(guard.strings.len()) {
            Ok(index) => index,
            Err(_) => panic!(
                "{}",
                InternError::TableOverflow {
                    count: guard.strings.len(),
                }
            ),
        };
        guard.strings.push(leaked);
        guard.map.insert(leaked, index);

        Name::from_raw(index)
    }

    /// Look up the string for a Name.
    pub fn lookup(&self, name: Name) -> &str {
        let guard = self.table.read();
        guard.strings[name.index()]
    }

    /// Look up the string for a Name, returning a `'static` reference.
    ///
    /// This is safe because all interned strings are leaked (never
    /// deallocated). Use this when the string outlives any borrow of the
    /// interner, such as in error messages carried up to the host.
    pub fn lookup_static(&self, name: Name) -> &'static str {
        let guard = self.table.read();
        guard.strings[name.index()]
    }

    /// Get the number of interned strings.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// Check if the interner is empty (only has the empty string).
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a [`StringInterner`].
///
/// This newtype enforces that interner sharing goes through one type instead
/// of ad-hoc `Arc<StringInterner>` values scattered through the engine. The
/// engine owns one, and hands clones to instrumentation and hosts.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    /// Create a new shared interner.
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_lookup() {
        let interner = StringInterner::new();

        let counter = interner.intern("counter");
        let render = interner.intern("render");
        let counter2 = interner.intern("counter");

        assert_eq!(counter, counter2);
        assert_ne!(counter, render);

        assert_eq!(interner.lookup(counter), "counter");
        assert_eq!(interner.lookup(render), "render");
    }

    #[test]
    fn test_empty_string() {
        let interner = StringInterner::new();
        let empty = interner.intern("");
        assert_eq!(empty, Name::EMPTY);
        assert_eq!(interner.lookup(Name::EMPTY), "");
    }

    #[test]
    fn test_shared_interner() {
        let interner = SharedInterner::new();
        let interner2 = interner.clone();

        let name1 = interner.intern("shared");
        let name2 = interner2.intern("shared");

        assert_eq!(name1, name2);
    }

    #[test]
    fn test_intern_owned() {
        let interner = StringInterner::new();

        let owned = String::from("setup");
        let name1 = interner.intern_owned(owned);
        let name2 = interner.intern("setup");

        assert_eq!(name1, name2);
        assert_eq!(interner.lookup(name1), "setup");
    }

    #[test]
    fn test_lookup_static_outlives_borrow() {
        let interner = StringInterner::new();
        let name = interner.intern("teardown");
        let s: &'static str = interner.lookup_static(name);
        assert_eq!(s, "teardown");
    }
}
