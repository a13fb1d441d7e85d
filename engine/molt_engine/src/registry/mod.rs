//! Name registries and the rename-matching heuristic.
//!
//! Each module keeps one registry per kind of wrapped item (exports,
//! classes). The registry maps names to their long-lived handles; it is the
//! only thing that decides whether a re-evaluated item keeps its identity.
//!
//! When a new evaluation announces its names, the diff against the registry
//! is interpreted conservatively: exactly one added and one removed name is
//! treated as a rename, removals alone drop the stale entries, and anything
//! more ambiguous is left untouched with a warning so no handle is ever
//! reassigned on a guess.

use molt_value::{Handle, Name};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Registry of live handles, one per surviving name.
pub type NameRegistry = FxHashMap<Name, Handle>;

/// Outcome of matching a new evaluation's names against a registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegistryUpdate {
    /// Every registered name is still present (new names may appear later,
    /// at wrap time).
    Unchanged,
    /// Exactly one name disappeared and one appeared: the handle moved.
    Renamed { from: Name, to: Name },
    /// Names disappeared with no additions; their entries were dropped.
    Removed(usize),
    /// Several names changed at once; the registry was left untouched.
    Ambiguous,
}

/// Match a new evaluation's names against the registry and update it.
///
/// Call this before wrapping any of the new evaluation's items: a rename
/// must move the handle to its new key first, otherwise the wrap step would
/// mint a fresh handle and the old one would be dropped as a removal.
pub fn update_registry(registry: &mut NameRegistry, new_names: &[Name]) -> RegistryUpdate {
    let new_set: FxHashSet<Name> = new_names.iter().copied().collect();

    let mut added: SmallVec<[Name; 4]> = SmallVec::new();
    for &name in new_names {
        if !registry.contains_key(&name) && !added.contains(&name) {
            added.push(name);
        }
    }
    let removed_count = registry
        .keys()
        .filter(|name| !new_set.contains(name))
        .count();

    if (added.len() > 1 && removed_count > 0) || (added.len() == 1 && removed_count > 1) {
        tracing::warn!(
            added = added.len(),
            removed = removed_count,
            "several names added and removed at once, cannot work out a matching"
        );
        return RegistryUpdate::Ambiguous;
    }

    if added.len() == 1 && removed_count == 1 {
        let to = added[0];
        let from = registry
            .keys()
            .find(|name| !new_set.contains(name))
            .copied();
        if let Some(from) = from {
            if let Some(handle) = registry.remove(&from) {
                registry.insert(to, handle);
                tracing::debug!(?from, ?to, "treating the add/remove pair as a rename");
                return RegistryUpdate::Renamed { from, to };
            }
        }
        return RegistryUpdate::Unchanged;
    }

    if removed_count > 0 {
        registry.retain(|name, _| new_set.contains(name));
        return RegistryUpdate::Removed(removed_count);
    }

    RegistryUpdate::Unchanged
}

#[cfg(test)]
mod tests;
