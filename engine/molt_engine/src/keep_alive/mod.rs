//! Keep-alive instance migration.
//!
//! Some instances are meant to outlive any single version of the module
//! that defined their class: a connection pool, an editor buffer, a game
//! world. A module opts a class in by registering it, then tracks the
//! instances that must survive. When the version is superseded, its
//! registered classes are matched positionally against the replacement's
//! and every tracked instance is re-pointed at its successor class.
//! Fields stay where they are; behavior moves.
//!
//! Matching is by declaration order and name, with a one-slot window on
//! each side so a single insertion, removal, or rename between versions
//! still lines up. Anything the window cannot explain is skipped with a
//! warning rather than guessed at.

use rustc_hash::FxHashMap;

use molt_value::{ClassKey, ClassValue, InstanceValue, SharedInterner};

use crate::errors::{unregistered_keep_alive, EngineError};
use crate::module::ModuleVersion;

/// Instances tracked under one registered class.
struct KeepAliveSet {
    /// Owner of the key, held so the class outlives its entry.
    class: ClassValue,
    instances: Vec<InstanceValue>,
}

/// Tracks keep-alive registrations and migrates instances between class
/// generations.
pub(crate) struct KeepAliveMigrator {
    interner: SharedInterner,
    sets: FxHashMap<ClassKey, KeepAliveSet>,
}

impl KeepAliveMigrator {
    pub fn new(interner: SharedInterner) -> Self {
        Self {
            interner,
            sets: FxHashMap::default(),
        }
    }

    /// Register a class the running version declared keep-alive.
    ///
    /// Registration order within a version is the order used to match
    /// against the replacement's classes later.
    pub fn register(&mut self, version: &ModuleVersion, class: ClassValue) {
        version.register_keep_alive_class(class.clone());
        self.sets.insert(
            class.key(),
            KeepAliveSet {
                class,
                instances: Vec::new(),
            },
        );
    }

    /// Track an instance of a registered class.
    pub fn track(&mut self, instance: &InstanceValue) -> Result<(), EngineError> {
        let class = instance.class();
        match self.sets.get_mut(&class.key()) {
            Some(set) => {
                set.instances.push(instance.clone());
                Ok(())
            }
            None => Err(unregistered_keep_alive(
                self.interner.lookup_static(class.name()),
            )),
        }
    }

    /// A version was superseded: line up its keep-alive classes with the
    /// replacement's and move every tracked instance across.
    pub fn module_reloaded(&mut self, old: &ModuleVersion, new: &ModuleVersion) {
        let old_classes = old.take_keep_alive_classes();
        if old_classes.is_empty() {
            return;
        }
        let new_classes = new.keep_alive_classes();

        let mut i = 0;
        let mut j = 0;
        while i < old_classes.len() && j < new_classes.len() {
            let old_class = &old_classes[i];
            let new_class = &new_classes[j];
            let old_next = old_classes.get(i + 1).map(ClassValue::name);
            let new_next = new_classes.get(j + 1).map(ClassValue::name);

            if old_class.name() == new_class.name() {
                self.migrate_set(old_class, new_class);
                i += 1;
                j += 1;
            } else if new_next == Some(old_class.name()) {
                // one class inserted before the match
                self.migrate_set(old_class, &new_classes[j + 1]);
                i += 1;
                j += 2;
            } else if old_next == Some(new_class.name()) {
                // one class removed before the match
                self.migrate_set(&old_classes[i + 1], new_class);
                i += 2;
                j += 1;
            } else if old_next == new_next {
                // names differ but the rest of both lists line up
                self.migrate_set(old_class, new_class);
                i += 1;
                j += 1;
            } else {
                tracing::warn!(
                    old = self.interner.lookup_static(old_class.name()),
                    new = self.interner.lookup_static(new_class.name()),
                    "keep-alive classes do not line up, instances of the old one are dropped"
                );
                i += 1;
                j += 1;
            }
        }

        // Whatever still sits under an old class's key found no successor.
        // Tracking ends for that class; its instances keep their old
        // behavior and later tracks of it are rejected.
        for old_class in &old_classes {
            let key = old_class.key();
            if new_classes.iter().any(|new_class| new_class.key() == key) {
                continue;
            }
            if self.sets.remove(&key).is_some() {
                tracing::debug!(
                    class = self.interner.lookup_static(old_class.name()),
                    "dropped the keep-alive set of a class with no successor"
                );
            }
        }
    }

    fn migrate_set(&mut self, old_class: &ClassValue, new_class: &ClassValue) {
        let Some(old_set) = self.sets.remove(&old_class.key()) else {
            return;
        };
        debug_assert!(old_set.class.same(old_class));

        for instance in &old_set.instances {
            instance.rebind_class(new_class);
        }
        tracing::debug!(
            class = self.interner.lookup_static(new_class.name()),
            instances = old_set.instances.len(),
            "migrated keep-alive instances"
        );

        match self.sets.get_mut(&new_class.key()) {
            Some(new_set) => new_set.instances.extend(old_set.instances),
            None => {
                self.sets.insert(
                    new_class.key(),
                    KeepAliveSet {
                        class: new_class.clone(),
                        instances: old_set.instances,
                    },
                );
            }
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
