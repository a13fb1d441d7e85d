//! Version migration.
//!
//! When the host swaps a module's version, responsibility for every older
//! version moves onto the replacement: the new version inherits the old
//! one's ancestor chain, the newest exports are patched into every live
//! ancestor's namespace view, and the superseded version's dispose hooks
//! finally run.

use crate::engine::Engine;
use crate::module::{ModuleVersion, Namespace};

impl Engine {
    /// Announce that `old` was superseded by whatever evaluates into
    /// `new_namespace`, handing over `old_view` as the patchable view of
    /// the old version's exports.
    ///
    /// Runs the migration immediately when that evaluation has already
    /// finished; otherwise parks `old` until it does. Either order ends in
    /// the same state.
    pub fn schedule_migration(
        &self,
        old: &ModuleVersion,
        old_view: Namespace,
        new_namespace: &Namespace,
    ) {
        old.set_mutable_view(old_view);
        let ready = {
            let mut pending = self.pending.borrow_mut();
            // Nothing will claim the retiring version's own cell after this.
            pending.discard_ready(old.exports());
            pending.claim(new_namespace, old.clone())
        };
        match ready {
            Some(new_version) => self.complete_migration(old, &new_version),
            None => tracing::debug!(
                locator = old.locator(),
                generation = old.generation(),
                "migration parked until the replacement finishes evaluating"
            ),
        }
    }

    /// Run a migration whose two sides have both arrived.
    ///
    /// Dispose hooks run last, once the replacement has fully taken over.
    pub(crate) fn complete_migration(&self, old: &ModuleVersion, new_version: &ModuleVersion) {
        tracing::debug!(
            locator = new_version.locator(),
            old_generation = old.generation(),
            new_generation = new_version.generation(),
            "completing migration"
        );

        self.keep_alive.borrow_mut().module_reloaded(old, new_version);

        let mut chain = old.take_ancestors();
        chain.push(old.clone());
        new_version.append_ancestors(chain);

        self.propagate_exports(new_version);
        old.run_dispose_hooks();
    }

    /// Patch the newest exports into every live ancestor's view, newest
    /// ancestor first.
    ///
    /// An ancestor whose view holds a name the replacement no longer
    /// exports cannot be patched; the host is asked to fully reload it.
    fn propagate_exports(&self, new_version: &ModuleVersion) {
        let new_namespace = new_version.exports();
        let mut mismatched: Vec<ModuleVersion> = Vec::new();

        for ancestor in new_version.live_ancestors_newest_first() {
            let Some(view) = ancestor.mutable_view() else {
                tracing::debug!(
                    generation = ancestor.generation(),
                    "ancestor has no recorded view, skipping"
                );
                continue;
            };
            if !patch_namespace(&view, new_namespace) {
                mismatched.push(ancestor);
            }
        }

        for ancestor in mismatched {
            tracing::warn!(
                locator = ancestor.locator(),
                generation = ancestor.generation(),
                "export shape changed, requesting full invalidation"
            );
            self.host
                .request_invalidate(ancestor.module(), ancestor.generation());
        }
    }
}

/// Assign every key of `view` from `new_namespace`.
///
/// Returns `false` as soon as a key is missing from the replacement; the
/// old shape can no longer be satisfied and the caller escalates.
fn patch_namespace(view: &Namespace, new_namespace: &Namespace) -> bool {
    for key in view.keys() {
        match new_namespace.get(key) {
            Some(value) => view.assign(key, value),
            None => return false,
        }
    }
    true
}
