//! Running-context stack.
//!
//! Evaluations nest: loading one module can trigger the evaluation of
//! another. Entering an evaluation pushes its version, finishing pops it,
//! and registrations (session values, dispose hooks, keep-alive classes)
//! always attach to the innermost running version.

use crate::module::ModuleVersion;

/// Stack of module versions currently evaluating.
#[derive(Default, Debug)]
pub struct RunningContext {
    stack: Vec<ModuleVersion>,
}

impl RunningContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a version's evaluation.
    pub fn push(&mut self, version: ModuleVersion) {
        self.stack.push(version);
    }

    /// Leave the innermost evaluation.
    pub fn pop(&mut self) -> Option<ModuleVersion> {
        self.stack.pop()
    }

    /// Innermost running version.
    pub fn current(&self) -> Option<ModuleVersion> {
        self.stack.last().cloned()
    }

    /// Nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleId;
    use molt_value::SharedInterner;

    fn version(interner: &SharedInterner, locator: &str, generation: u32) -> ModuleVersion {
        let module = ModuleId::new(interner.intern(locator));
        ModuleVersion::new(module, generation, locator.to_owned(), None)
    }

    #[test]
    fn test_nested_evaluations_stack() {
        let interner = SharedInterner::default();
        let outer = version(&interner, "app.mod", 1);
        let inner = version(&interner, "lib.mod", 1);

        let mut context = RunningContext::new();
        assert!(context.current().is_none());

        context.push(outer.clone());
        context.push(inner.clone());
        assert_eq!(context.depth(), 2);
        assert!(context.current().is_some_and(|v| v.same(&inner)));

        assert!(context.pop().is_some_and(|v| v.same(&inner)));
        assert!(context.current().is_some_and(|v| v.same(&outer)));

        assert!(context.pop().is_some_and(|v| v.same(&outer)));
        assert!(context.pop().is_none());
    }
}
