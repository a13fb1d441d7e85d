//! The engine service.
//!
//! One [`Engine`] serves one module graph. Instrumented module code calls
//! into it at evaluation time (registering versions, wrapping exports,
//! preserving state) and the host calls into it when it swaps versions
//! (scheduling migrations, confirming retirement).

#![expect(
    clippy::disallowed_types,
    reason = "Rc shares the engine with captured callbacks and the host seam"
)]

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use molt_value::{ClassValue, Handle, InstanceValue, Name, SharedInterner, Value};

use crate::context::RunningContext;
use crate::errors::{no_running_version, EngineResult};
use crate::host::{NullReloadHost, ReloadHost};
use crate::keep_alive::KeepAliveMigrator;
use crate::module::{canonical_locator, ModuleId, ModuleVersion};
use crate::pending::PendingUpdates;
use crate::registry::{update_registry, NameRegistry, RegistryUpdate};

/// Per-module bookkeeping that survives every replacement.
pub(crate) struct ModuleState {
    /// Export handles, alive as long as the module is.
    exports: NameRegistry,
    /// Class handles, kept separate so value exports never collide.
    classes: NameRegistry,
    current: Option<ModuleVersion>,
    /// Raw locator of the most recent registration.
    latest_locator: String,
    next_generation: u32,
}

impl ModuleState {
    fn new() -> Self {
        ModuleState {
            exports: NameRegistry::default(),
            classes: NameRegistry::default(),
            current: None,
            latest_locator: String::new(),
            next_generation: 1,
        }
    }
}

/// The live code replacement engine.
///
/// The engine is single threaded, like the module code it serves. Interior
/// mutability keeps the public surface `&self` so instrumented code,
/// captured callbacks, and the host can all hold the same `Rc<Engine>`.
pub struct Engine {
    interner: SharedInterner,
    modules: RefCell<FxHashMap<ModuleId, ModuleState>>,
    /// Shared with captured callbacks, which re-enter it on their own.
    context: Rc<RefCell<RunningContext>>,
    pub(crate) pending: RefCell<PendingUpdates>,
    pub(crate) keep_alive: RefCell<KeepAliveMigrator>,
    pub(crate) host: Rc<dyn ReloadHost>,
}

impl Engine {
    /// Engine with no host attached; invalidation requests are dropped.
    pub fn new() -> Self {
        Engine::with_host(Rc::new(NullReloadHost))
    }

    /// Engine reporting to `host`.
    pub fn with_host(host: Rc<dyn ReloadHost>) -> Self {
        let interner = SharedInterner::default();
        Engine {
            interner: interner.clone(),
            modules: RefCell::new(FxHashMap::default()),
            context: Rc::new(RefCell::new(RunningContext::new())),
            pending: RefCell::new(PendingUpdates::new()),
            keep_alive: RefCell::new(KeepAliveMigrator::new(interner)),
            host,
        }
    }

    /// The engine's string interner.
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Intern a name.
    pub fn intern(&self, name: &str) -> Name {
        self.interner.intern(name)
    }

    /// Module identity for a locator, canonicalized.
    ///
    /// Locators differing only in their query resolve to the same module;
    /// fragments are part of the identity.
    pub fn module_id(&self, locator: &str) -> ModuleId {
        ModuleId::new(self.interner.intern(canonical_locator(locator).as_ref()))
    }

    /// Register a new version of the module behind `locator`.
    ///
    /// The new version becomes the module's current one and links back to
    /// the version it replaces. Evaluation has not started yet; call
    /// [`Engine::begin_evaluation`] next.
    pub fn register_version(&self, locator: &str) -> ModuleVersion {
        let module = self.module_id(locator);
        let mut modules = self.modules.borrow_mut();
        let state = modules.entry(module).or_insert_with(ModuleState::new);

        let generation = state.next_generation;
        state.next_generation += 1;
        let version =
            ModuleVersion::new(module, generation, locator.to_owned(), state.current.clone());
        state.current = Some(version.clone());
        state.latest_locator = locator.to_owned();

        tracing::debug!(locator, generation, "registered module version");
        version
    }

    /// Latest registered version of a module.
    pub fn current_version(&self, module: ModuleId) -> Option<ModuleVersion> {
        self.modules
            .borrow()
            .get(&module)
            .and_then(|state| state.current.clone())
    }

    /// Most recent raw locator registered for the module behind `locator`.
    ///
    /// Useful for re-requesting a module by its newest query string. Falls
    /// back to the input when the module was never registered.
    pub fn latest_locator(&self, locator: &str) -> String {
        let module = self.module_id(locator);
        let modules = self.modules.borrow();
        match modules.get(&module) {
            Some(state) if !state.latest_locator.is_empty() => state.latest_locator.clone(),
            _ => locator.to_owned(),
        }
    }

    /// Enter a version's evaluation.
    pub fn begin_evaluation(&self, version: &ModuleVersion) {
        tracing::debug!(
            locator = version.locator(),
            generation = version.generation(),
            "evaluation started"
        );
        self.context.borrow_mut().push(version.clone());
    }

    /// Leave the innermost evaluation and release anything waiting on it.
    ///
    /// Old versions parked against this version's namespace migrate now.
    pub fn finish_evaluation(&self) -> EngineResult<ModuleVersion> {
        let version = self
            .context
            .borrow_mut()
            .pop()
            .ok_or_else(|| no_running_version("finish_evaluation"))?;
        tracing::debug!(
            locator = version.locator(),
            generation = version.generation(),
            "evaluation finished"
        );

        let parked = self
            .pending
            .borrow_mut()
            .resolve(version.exports(), version.clone());
        for old in parked {
            self.complete_migration(&old, &version);
        }
        Ok(version)
    }

    /// Innermost version currently evaluating, if any.
    pub fn running_version(&self) -> Option<ModuleVersion> {
        self.context.borrow().current()
    }

    /// Number of migrations still waiting for one of their two sides.
    pub fn pending_migrations(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Reconcile the running version's export names with the previous
    /// version's registry before any export is wrapped.
    ///
    /// A single changed name moves its handle to the new name; several
    /// changes at once leave the registry alone and let fresh handles be
    /// minted when the exports are wrapped.
    pub fn update_export_registry(&self, names: &[Name]) -> EngineResult<RegistryUpdate> {
        let version = self.require_current("update_export_registry")?;
        let mut modules = self.modules.borrow_mut();
        let state = modules.entry(version.module()).or_insert_with(ModuleState::new);
        Ok(update_registry(&mut state.exports, names))
    }

    /// Same reconciliation for the module's class names.
    pub fn update_class_registry(&self, names: &[Name]) -> EngineResult<RegistryUpdate> {
        let version = self.require_current("update_class_registry")?;
        let mut modules = self.modules.borrow_mut();
        let state = modules.entry(version.module()).or_insert_with(ModuleState::new);
        Ok(update_registry(&mut state.classes, names))
    }

    /// Export a value through the module's stable handle for `name`.
    ///
    /// Reference values are wrapped: importers get the handle, and later
    /// versions retarget it in place so imports never go stale. Primitive
    /// values pass through untouched. Either way the result is defined in
    /// the running version's namespace and returned for local use.
    pub fn wrap_export(&self, name: Name, value: Value) -> EngineResult<Value> {
        let version = self.require_current("wrap_export")?;
        let exported = if wrappable(&value) {
            let mut modules = self.modules.borrow_mut();
            let state = modules.entry(version.module()).or_insert_with(ModuleState::new);
            let handle = match state.exports.get(&name) {
                Some(handle) => {
                    handle.retarget(value);
                    handle.clone()
                }
                None => {
                    let handle = Handle::new(name, value);
                    state.exports.insert(name, handle.clone());
                    handle
                }
            };
            Value::Handle(handle)
        } else {
            value
        };
        version.exports().define(name, exported.clone());
        Ok(exported)
    }

    /// Export a class through a behavior-carrying handle for `name`.
    ///
    /// Retargeting a class handle also swaps the behavior cell shared by
    /// the previous class's instances, so existing instances pick up the
    /// new methods without being touched one by one.
    pub fn wrap_class(&self, name: Name, class: ClassValue) -> EngineResult<Value> {
        let version = self.require_current("wrap_class")?;
        let handle = {
            let mut modules = self.modules.borrow_mut();
            let state = modules.entry(version.module()).or_insert_with(ModuleState::new);
            match state.classes.get(&name) {
                Some(handle) => {
                    handle.retarget(Value::Class(class));
                    handle.clone()
                }
                None => {
                    let handle = Handle::for_class(name, class);
                    state.classes.insert(name, handle.clone());
                    handle
                }
            }
        };
        let exported = Value::Handle(handle);
        version.exports().define(name, exported.clone());
        Ok(exported)
    }

    /// Carry a keyed value across from the version this one replaced.
    ///
    /// `migrate` sees the predecessor's value for `key` (`None` on first
    /// evaluation) and returns the value to keep for this version.
    pub fn preserve(
        &self,
        key: Name,
        migrate: impl FnOnce(Option<Value>) -> Value,
    ) -> EngineResult<Value> {
        let version = self.require_current("preserve")?;
        Ok(version.preserve(key, migrate))
    }

    /// Run `hook` when the running version is migrated away from.
    ///
    /// Hooks run newest first, once, after the replacement has taken over.
    pub fn on_dispose(&self, hook: impl FnOnce() + 'static) -> EngineResult<()> {
        let version = self.require_current("on_dispose")?;
        version.on_dispose(Box::new(hook));
        Ok(())
    }

    /// Declare a class of the running version keep-alive.
    pub fn register_keep_alive(&self, class: &ClassValue) -> EngineResult<()> {
        let version = self.require_current("register_keep_alive")?;
        self.keep_alive.borrow_mut().register(&version, class.clone());
        Ok(())
    }

    /// Track an instance so it survives reloads of its class.
    pub fn keep_alive(&self, instance: &InstanceValue) -> EngineResult<()> {
        self.keep_alive.borrow_mut().track(instance)
    }

    /// Capture the running version for a callback that fires later.
    ///
    /// The returned closure re-enters the captured version's context
    /// around `run`, so engine calls made inside it attach to the version
    /// that created the callback, not to whatever happens to be evaluating
    /// when it fires. The context is left again even when `run` panics.
    pub fn capture_context<R>(
        &self,
        run: impl Fn() -> R + 'static,
    ) -> EngineResult<impl Fn() -> R> {
        let version = self.require_current("capture_context")?;
        let context = Rc::clone(&self.context);
        Ok(move || {
            context.borrow_mut().push(version.clone());
            let _leave = LeaveContext {
                context: Rc::clone(&context),
            };
            run()
        })
    }

    /// Host confirmation that a superseded version left the running graph.
    ///
    /// Retirement stops future patches from reaching the version; the next
    /// propagation pass prunes it from its successor's ancestor chain.
    pub fn confirm_retired(&self, version: &ModuleVersion) {
        tracing::debug!(
            locator = version.locator(),
            generation = version.generation(),
            "version retired"
        );
        version.mark_retired();
    }

    fn require_current(&self, operation: &'static str) -> EngineResult<ModuleVersion> {
        self.context
            .borrow()
            .current()
            .ok_or_else(|| no_running_version(operation))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

/// Pops the entered version on drop, so an unwinding callback cannot
/// leave the context stack unbalanced.
struct LeaveContext {
    context: Rc<RefCell<RunningContext>>,
}

impl Drop for LeaveContext {
    fn drop(&mut self) {
        self.context.borrow_mut().pop();
    }
}

fn wrappable(value: &Value) -> bool {
    matches!(
        value,
        Value::Record(_)
            | Value::Function(_)
            | Value::Class(_)
            | Value::Instance(_)
            | Value::Handle(_)
    )
}
