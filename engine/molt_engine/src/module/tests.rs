use super::*;
use molt_value::{Handle, Live, SharedInterner};
use pretty_assertions::assert_eq;

#[test]
fn test_canonical_locator_passthrough() {
    assert!(matches!(
        canonical_locator("lib/ui.mod"),
        Cow::Borrowed("lib/ui.mod")
    ));
    assert_eq!(canonical_locator("lib/ui.mod#part"), "lib/ui.mod#part");
}

#[test]
fn test_canonical_locator_strips_query() {
    assert_eq!(canonical_locator("lib/ui.mod?t=1699"), "lib/ui.mod");
    assert_eq!(canonical_locator("lib/ui.mod?"), "lib/ui.mod");
}

#[test]
fn test_canonical_locator_keeps_fragment_after_query() {
    assert_eq!(
        canonical_locator("lib/ui.mod?t=1699#part"),
        "lib/ui.mod#part"
    );
}

#[test]
fn test_canonical_locator_leaves_query_inside_fragment() {
    // A '?' after the '#' belongs to the fragment and is not a query.
    assert!(matches!(
        canonical_locator("lib/ui.mod#part?x=1"),
        Cow::Borrowed("lib/ui.mod#part?x=1")
    ));
    assert_eq!(canonical_locator("lib/ui.mod?t=1#part?x=1"), "lib/ui.mod#part?x=1");
}

#[test]
fn test_namespace_keeps_definition_order() {
    let interner = SharedInterner::default();
    let b = interner.intern("b");
    let a = interner.intern("a");

    let ns = Namespace::new();
    ns.define(b, Value::int(1));
    ns.define(a, Value::int(2));
    ns.define(b, Value::int(3));

    assert_eq!(ns.keys(), vec![b, a]);
    assert_eq!(ns.get(b), Some(Value::int(3)));
}

#[test]
fn test_namespace_assign_retargets_handle_slot() {
    let interner = SharedInterner::default();
    let render = interner.intern("render");

    let ns = Namespace::new();
    let handle = Handle::new(render, Value::int(1));
    ns.define(render, Value::Handle(handle.clone()));

    ns.assign(render, Value::int(2));

    let Some(Value::Handle(slot)) = ns.get(render) else {
        panic!("expected handle slot");
    };
    assert!(slot.same(&handle));
    assert_eq!(handle.target(), Value::int(2));
}

#[test]
fn test_namespace_assign_same_handle_is_noop() {
    let interner = SharedInterner::default();
    let render = interner.intern("render");

    let ns = Namespace::new();
    let handle = Handle::new(render, Value::int(1));
    ns.define(render, Value::Handle(handle.clone()));

    ns.assign(render, Value::Handle(handle.clone()));

    assert_eq!(handle.target(), Value::int(1));
}

#[test]
fn test_namespace_assign_overwrites_plain_slot() {
    let interner = SharedInterner::default();
    let flag = interner.intern("flag");
    let extra = interner.intern("extra");

    let ns = Namespace::new();
    ns.define(flag, Value::int(1));

    ns.assign(flag, Value::int(2));
    ns.assign(extra, Value::int(3));

    assert_eq!(ns.get(flag), Some(Value::int(2)));
    assert_eq!(ns.get(extra), Some(Value::int(3)));
}

fn test_module(interner: &SharedInterner) -> ModuleId {
    ModuleId::new(interner.intern("lib/ui.mod"))
}

#[test]
fn test_preserve_carries_values_across_versions() {
    let interner = SharedInterner::default();
    let module = test_module(&interner);
    let state = interner.intern("state");

    let v1 = ModuleVersion::new(module, 1, "lib/ui.mod".into(), None);
    let first = v1.preserve(state, |previous| {
        assert!(previous.is_none());
        Value::int(1)
    });
    assert_eq!(first, Value::int(1));

    let v2 = ModuleVersion::new(module, 2, "lib/ui.mod?t=2".into(), Some(v1.clone()));
    let second = v2.preserve(state, |previous| match previous {
        Some(value) => value,
        None => Value::Void,
    });
    assert_eq!(second, Value::int(1));
    assert_eq!(v2.session_value(state), Some(Value::int(1)));
}

#[test]
fn test_dispose_hooks_run_newest_first_and_once() {
    let interner = SharedInterner::default();
    let module = test_module(&interner);

    let version = ModuleVersion::new(module, 1, "lib/ui.mod".into(), None);
    let order = Live::new(Vec::new());

    let first = order.clone();
    version.on_dispose(Box::new(move || first.borrow_mut().push("first")));
    let second = order.clone();
    version.on_dispose(Box::new(move || second.borrow_mut().push("second")));

    version.run_dispose_hooks();
    version.run_dispose_hooks();

    assert_eq!(*order.borrow(), vec!["second", "first"]);
}

#[test]
fn test_live_ancestors_prunes_retired_newest_first() {
    let interner = SharedInterner::default();
    let module = test_module(&interner);

    let v1 = ModuleVersion::new(module, 1, "lib/ui.mod".into(), None);
    let v2 = ModuleVersion::new(module, 2, "lib/ui.mod?t=2".into(), Some(v1.clone()));
    let v3 = ModuleVersion::new(module, 3, "lib/ui.mod?t=3".into(), Some(v2.clone()));
    let v4 = ModuleVersion::new(module, 4, "lib/ui.mod?t=4".into(), Some(v3.clone()));

    let mut chain: SmallVec<[ModuleVersion; 2]> = SmallVec::new();
    chain.push(v1.clone());
    chain.push(v2.clone());
    chain.push(v3.clone());
    v4.append_ancestors(chain);

    v2.mark_retired();
    let live = v4.live_ancestors_newest_first();

    assert_eq!(live.len(), 2);
    assert!(live[0].same(&v3));
    assert!(live[1].same(&v1));
    assert!(v2.predecessor().is_none());

    // the pruned version is gone from the list for good
    let live = v4.live_ancestors_newest_first();
    assert_eq!(live.len(), 2);
}
