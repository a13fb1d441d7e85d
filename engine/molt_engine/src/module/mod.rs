//! Module identity, versions, and namespaces.
//!
//! A module keeps one identity across arbitrarily many replacements; each
//! replacement is a fresh [`ModuleVersion`]. The version owns everything
//! scoped to a single evaluation: the namespace it exported, its session
//! store, its dispose hooks, and the list of superseded versions it is
//! responsible for keeping patched.

// Rc identities back versions and namespaces
#![expect(
    clippy::disallowed_types,
    reason = "Rc identities for module versions and namespaces"
)]

use indexmap::IndexMap;
use molt_value::{ClassValue, Name, Value};
use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Strip the cache-busting query from a locator, keeping any fragment.
///
/// Hosts hand out a fresh locator per reload (`lib/ui.mod?t=1699`). All of
/// them canonicalize to the same underlying locator, which is what module
/// identity is keyed on.
pub fn canonical_locator(raw: &str) -> Cow<'_, str> {
    // The fragment starts at the first '#'; a '?' inside it is fragment
    // text, not a query.
    let fragment = raw.find('#');
    let path = &raw[..fragment.unwrap_or(raw.len())];
    let Some(query) = path.find('?') else {
        return Cow::Borrowed(raw);
    };
    match fragment {
        Some(fragment) => {
            let mut out = String::with_capacity(raw.len());
            out.push_str(&raw[..query]);
            out.push_str(&raw[fragment..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(&raw[..query]),
    }
}

/// Stable identity of a module across replacements.
///
/// Wraps the interned canonical locator.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ModuleId(Name);

impl ModuleId {
    pub(crate) fn new(name: Name) -> Self {
        ModuleId(name)
    }

    /// Interned canonical locator.
    pub fn name(self) -> Name {
        self.0
    }
}

/// Ordered namespace of a single module version.
///
/// Entries keep evaluation order. Clones share the same entry map, and
/// namespace identity, not contents, is what the engine keys pending
/// migrations on.
#[derive(Clone)]
pub struct Namespace(Rc<NamespaceCore>);

struct NamespaceCore {
    entries: RefCell<IndexMap<Name, Value, FxBuildHasher>>,
}

impl Namespace {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Namespace(Rc::new(NamespaceCore {
            entries: RefCell::new(IndexMap::default()),
        }))
    }

    /// Record an entry in evaluation order, replacing any previous value
    /// under the name.
    pub fn define(&self, name: Name, value: Value) {
        self.0.entries.borrow_mut().insert(name, value);
    }

    /// Read an entry.
    pub fn get(&self, name: Name) -> Option<Value> {
        self.0.entries.borrow().get(&name).cloned()
    }

    /// Whether the namespace has an entry under the name.
    pub fn contains(&self, name: Name) -> bool {
        self.0.entries.borrow().contains_key(&name)
    }

    /// Snapshot of the keys in definition order.
    pub fn keys(&self) -> Vec<Name> {
        self.0.entries.borrow().keys().copied().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.entries.borrow().len()
    }

    /// Whether the namespace has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.entries.borrow().is_empty()
    }

    /// Assign into a slot the way migration does.
    ///
    /// A handle already sitting in the slot is retargeted in place, so
    /// everything that captured the slot's value keeps working; pointing a
    /// handle at itself is a no-op. Any other slot is overwritten.
    pub fn assign(&self, name: Name, value: Value) {
        let mut entries = self.0.entries.borrow_mut();
        let slot = match entries.get(&name) {
            Some(Value::Handle(handle)) => Some(handle.clone()),
            _ => None,
        };
        match slot {
            Some(handle) => match value {
                Value::Handle(ref incoming) if incoming.same(&handle) => {}
                other => handle.retarget(other),
            },
            None => {
                entries.insert(name, value);
            }
        }
    }

    /// Whether two values are the same namespace.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Stable address usable as a map key while the namespace is alive.
    pub(crate) fn key(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({} entries)", self.len())
    }
}

/// Dispose hook registered by module code.
pub type DisposeFn = Box<dyn FnOnce()>;

/// One evaluation of a module.
///
/// Identity is the version: clones share state. The session store, dispose
/// list, and ancestor list die with the version; the namespace lives for as
/// long as anything that imported it.
#[derive(Clone)]
pub struct ModuleVersion(Rc<VersionCore>);

struct VersionCore {
    module: ModuleId,
    generation: u32,
    locator: String,
    exports: Namespace,
    predecessor: RefCell<Option<ModuleVersion>>,
    mutable_view: RefCell<Option<Namespace>>,
    session: RefCell<FxHashMap<Name, Value>>,
    dispose: RefCell<Vec<DisposeFn>>,
    ancestors: RefCell<SmallVec<[ModuleVersion; 2]>>,
    keep_alive_classes: RefCell<SmallVec<[ClassValue; 2]>>,
    retired: Cell<bool>,
    disposed: Cell<bool>,
}

impl ModuleVersion {
    pub(crate) fn new(
        module: ModuleId,
        generation: u32,
        locator: String,
        predecessor: Option<ModuleVersion>,
    ) -> Self {
        ModuleVersion(Rc::new(VersionCore {
            module,
            generation,
            locator,
            exports: Namespace::new(),
            predecessor: RefCell::new(predecessor),
            mutable_view: RefCell::new(None),
            session: RefCell::new(FxHashMap::default()),
            dispose: RefCell::new(Vec::new()),
            ancestors: RefCell::new(SmallVec::new()),
            keep_alive_classes: RefCell::new(SmallVec::new()),
            retired: Cell::new(false),
            disposed: Cell::new(false),
        }))
    }

    /// Identity of the module this version belongs to.
    pub fn module(&self) -> ModuleId {
        self.0.module
    }

    /// Position in the module's replacement sequence, starting at 1.
    pub fn generation(&self) -> u32 {
        self.0.generation
    }

    /// Raw locator this version was loaded from, query and all.
    pub fn locator(&self) -> &str {
        &self.0.locator
    }

    /// The namespace this version exports into.
    pub fn exports(&self) -> &Namespace {
        &self.0.exports
    }

    /// Version this one replaced, while the link is still intact.
    pub fn predecessor(&self) -> Option<ModuleVersion> {
        self.0.predecessor.borrow().clone()
    }

    pub(crate) fn clear_predecessor(&self) {
        *self.0.predecessor.borrow_mut() = None;
    }

    /// Whether the host confirmed this version is out of the running graph.
    pub fn is_retired(&self) -> bool {
        self.0.retired.get()
    }

    pub(crate) fn mark_retired(&self) {
        self.0.retired.set(true);
    }

    /// Value preserved under `key` by this version, if any.
    pub fn session_value(&self, key: Name) -> Option<Value> {
        self.0.session.borrow().get(&key).cloned()
    }

    /// Carry a keyed value across from the predecessor's session.
    ///
    /// `migrate` sees the predecessor's value for the key (`None` on first
    /// evaluation) and returns the value to store for this version.
    pub(crate) fn preserve(
        &self,
        key: Name,
        migrate: impl FnOnce(Option<Value>) -> Value,
    ) -> Value {
        let previous = self.predecessor().and_then(|p| p.session_value(key));
        let value = migrate(previous);
        self.0.session.borrow_mut().insert(key, value.clone());
        value
    }

    pub(crate) fn on_dispose(&self, hook: DisposeFn) {
        self.0.dispose.borrow_mut().push(hook);
    }

    /// Run dispose hooks newest-first, at most once.
    pub(crate) fn run_dispose_hooks(&self) {
        if self.0.disposed.replace(true) {
            return;
        }
        let hooks = std::mem::take(&mut *self.0.dispose.borrow_mut());
        for hook in hooks.into_iter().rev() {
            hook();
        }
    }

    pub(crate) fn set_mutable_view(&self, view: Namespace) {
        *self.0.mutable_view.borrow_mut() = Some(view);
    }

    pub(crate) fn mutable_view(&self) -> Option<Namespace> {
        self.0.mutable_view.borrow().clone()
    }

    pub(crate) fn take_ancestors(&self) -> SmallVec<[ModuleVersion; 2]> {
        std::mem::take(&mut *self.0.ancestors.borrow_mut())
    }

    pub(crate) fn append_ancestors(&self, versions: SmallVec<[ModuleVersion; 2]>) {
        self.0.ancestors.borrow_mut().extend(versions);
    }

    /// Drop retired ancestors, breaking their chain links, and return the
    /// surviving ones newest-first.
    pub(crate) fn live_ancestors_newest_first(&self) -> SmallVec<[ModuleVersion; 2]> {
        let mut list = self.0.ancestors.borrow_mut();
        let mut live = SmallVec::new();
        let mut index = list.len();
        while index > 0 {
            index -= 1;
            if list[index].is_retired() {
                let removed = list.remove(index);
                removed.clear_predecessor();
            } else {
                live.push(list[index].clone());
            }
        }
        live
    }

    pub(crate) fn register_keep_alive_class(&self, class: ClassValue) {
        self.0.keep_alive_classes.borrow_mut().push(class);
    }

    pub(crate) fn take_keep_alive_classes(&self) -> SmallVec<[ClassValue; 2]> {
        std::mem::take(&mut *self.0.keep_alive_classes.borrow_mut())
    }

    pub(crate) fn keep_alive_classes(&self) -> SmallVec<[ClassValue; 2]> {
        self.0.keep_alive_classes.borrow().clone()
    }

    /// Whether two values are the same version.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ModuleVersion({:?} gen {}{})",
            self.0.module,
            self.0.generation,
            if self.is_retired() { ", retired" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests;
