//! One-shot rendezvous between a finishing evaluation and a scheduled
//! migration.
//!
//! A replacement is only complete once two independent events have both
//! happened: the host announced which old version the new namespace
//! supersedes, and the new version's evaluation finished. The events can
//! arrive in either order. Whichever side arrives first parks in a cell
//! keyed by the namespace; the other side's arrival claims the cell and
//! removes it, so the same pair never migrates twice.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::module::{ModuleVersion, Namespace};

/// Superseded versions parked until a namespace's evaluation finishes.
pub(crate) type ParkedVersions = SmallVec<[ModuleVersion; 1]>;

#[derive(Debug)]
enum PendingState {
    /// The evaluation finished first; its version waits to be claimed.
    Ready(ModuleVersion),
    /// Supersession arrived first; old versions wait for the evaluation.
    Waiting(ParkedVersions),
}

#[derive(Debug)]
struct PendingCell {
    /// Owner of the key, held so the namespace outlives the cell.
    namespace: Namespace,
    state: PendingState,
}

/// Pending-migration cells, keyed by namespace identity.
#[derive(Default, Debug)]
pub(crate) struct PendingUpdates {
    cells: FxHashMap<usize, PendingCell>,
}

impl PendingUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer side: a version finished evaluating into `namespace`.
    ///
    /// Returns the old versions already waiting on it and clears the cell.
    /// With no waiters the version parks as ready for a later claim.
    pub fn resolve(&mut self, namespace: &Namespace, version: ModuleVersion) -> ParkedVersions {
        let key = namespace.key();
        match self.cells.remove(&key) {
            Some(cell) => {
                debug_assert!(cell.namespace.same(namespace));
                match cell.state {
                    PendingState::Waiting(parked) => parked,
                    PendingState::Ready(stale) => {
                        tracing::debug!(
                            locator = stale.locator(),
                            generation = stale.generation(),
                            "parked version was never claimed, replacing it"
                        );
                        self.park_ready(namespace, version);
                        ParkedVersions::new()
                    }
                }
            }
            None => {
                self.park_ready(namespace, version);
                ParkedVersions::new()
            }
        }
    }

    /// Consumer side: `old` was superseded by whatever evaluates into
    /// `namespace`.
    ///
    /// Claims and clears the parked version if the evaluation already
    /// finished; otherwise parks `old` until it does.
    pub fn claim(&mut self, namespace: &Namespace, old: ModuleVersion) -> Option<ModuleVersion> {
        let key = namespace.key();
        match self.cells.remove(&key) {
            Some(cell) => {
                debug_assert!(cell.namespace.same(namespace));
                match cell.state {
                    PendingState::Ready(version) => Some(version),
                    PendingState::Waiting(mut parked) => {
                        parked.push(old);
                        self.cells.insert(
                            key,
                            PendingCell {
                                namespace: namespace.clone(),
                                state: PendingState::Waiting(parked),
                            },
                        );
                        None
                    }
                }
            }
            None => {
                let mut parked = ParkedVersions::new();
                parked.push(old);
                self.cells.insert(
                    key,
                    PendingCell {
                        namespace: namespace.clone(),
                        state: PendingState::Waiting(parked),
                    },
                );
                None
            }
        }
    }

    /// Drops the parked version for `namespace` once nothing can claim it.
    ///
    /// Scheduling a migration away from a version means no future claim
    /// will name that version's own namespace, so a still-ready cell there
    /// would pin the retired version forever. A waiting cell is put back
    /// untouched: its parked versions are owed a release when the
    /// evaluation finishes.
    pub fn discard_ready(&mut self, namespace: &Namespace) {
        let key = namespace.key();
        match self.cells.remove(&key) {
            Some(PendingCell {
                state: PendingState::Ready(version),
                ..
            }) => {
                tracing::debug!(
                    locator = version.locator(),
                    generation = version.generation(),
                    "dropped the unclaimed version of a superseded namespace"
                );
            }
            Some(cell) => {
                self.cells.insert(key, cell);
            }
            None => {}
        }
    }

    /// Number of namespaces with one side still waiting.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    fn park_ready(&mut self, namespace: &Namespace, version: ModuleVersion) {
        self.cells.insert(
            namespace.key(),
            PendingCell {
                namespace: namespace.clone(),
                state: PendingState::Ready(version),
            },
        );
    }
}
