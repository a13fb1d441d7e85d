//! Live code replacement engine.
//!
//! `molt_engine` keeps a running program and its latest source in step
//! without a restart. The host compiles and evaluates new module versions;
//! the engine gives every export a stable identity across versions, keeps
//! old importers reading current values, migrates session state and
//! long-lived instances, and tells the host when an edit is too large to
//! patch and needs a real reload.
//!
//! A replacement runs through a fixed sequence:
//!
//! ```text
//! register_version ─► begin_evaluation ─► update_*_registry
//!                                             │
//!                      wrap_export / wrap_class / preserve / on_dispose
//!                                             │
//!                                     finish_evaluation
//!                                             │
//!            schedule_migration ──────► (both sides in) ──► patch views,
//!            (host, either order)                           run dispose
//! ```
//!
//! The two inputs to a migration, "the new version finished evaluating"
//! and "the host swapped the module", arrive in no particular order;
//! [`Engine::schedule_migration`] and [`Engine::finish_evaluation`]
//! rendezvous through a one-shot cell so either order converges.
//!
//! The engine is single threaded and uses interior mutability throughout;
//! share it as `Rc<Engine>` between instrumented module code and the host.

mod context;
mod engine;
pub mod errors;
mod host;
mod keep_alive;
mod migrate;
mod module;
mod pending;
mod registry;

pub use context::RunningContext;
pub use engine::Engine;
pub use errors::{EngineError, EngineResult};
pub use host::{NullReloadHost, RecordingReloadHost, ReloadHost};
pub use module::{canonical_locator, DisposeFn, ModuleId, ModuleVersion, Namespace};
pub use registry::{update_registry, NameRegistry, RegistryUpdate};

// Hosts embed one crate; surface the value model here too.
pub use molt_value::{
    Behavior, Capabilities, ClassKey, ClassValue, ConstructFn, FunctionValue, Handle,
    InstanceValue, InternError, Live, MethodTable, Name, NativeFn, RecordValue, SharedInterner,
    StringInterner, Value, ValueError, ValueResult,
};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=molt_engine=debug` or `RUST_LOG=molt_engine=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
