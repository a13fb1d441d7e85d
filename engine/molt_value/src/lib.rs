//! Value model for the Molt live-replacement engine.
//!
//! This crate defines the single-threaded value system the engine swaps at
//! runtime: interned [`Name`]s, shared [`Live`] cells, and the stable
//! [`Handle`] indirection that lets a module's exports be replaced without
//! invalidating anything that captured them.
//!
//! The companion crate `molt_engine` drives these values through module
//! versions, registries, and migrations.

pub mod error;
mod handle;
mod interner;
mod live;
mod name;
mod value;

pub use error::{ValueError, ValueResult};
pub use handle::{Capabilities, Handle};
pub use interner::{InternError, SharedInterner, StringInterner};
pub use live::Live;
pub use name::Name;
pub use value::{
    Behavior, ClassKey, ClassValue, ConstructFn, FunctionValue, Heap, InstanceValue, MethodTable,
    NativeFn, RecordValue, Value,
};
