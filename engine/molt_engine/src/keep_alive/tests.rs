use pretty_assertions::assert_eq;
use rustc_hash::FxHashMap;

use molt_value::{ClassValue, FunctionValue, InstanceValue, MethodTable, SharedInterner, Value};

use super::KeepAliveMigrator;
use crate::errors::unregistered_keep_alive;
use crate::module::{ModuleId, ModuleVersion};

fn version(interner: &SharedInterner, locator: &str, generation: u32) -> ModuleVersion {
    let module = ModuleId::new(interner.intern(locator));
    ModuleVersion::new(module, generation, locator.to_owned(), None)
}

/// Class whose `ping` method answers `reply` and whose constructor stores
/// its first argument under `tag`.
fn service_class(interner: &SharedInterner, name: &str, reply: &'static str) -> ClassValue {
    let class_name = interner.intern(name);
    let ping = interner.intern("ping");
    let tag = interner.intern("tag");

    let mut methods = MethodTable::new();
    methods.insert(
        ping,
        FunctionValue::new(ping, move |_receiver, _args| Ok(Value::string(reply))),
    );
    ClassValue::new(
        class_name,
        move |args| {
            let mut fields = FxHashMap::default();
            fields.insert(tag, args.first().cloned().unwrap_or(Value::Void));
            Ok(fields)
        },
        methods,
    )
}

fn ping(interner: &SharedInterner, instance: &InstanceValue) -> Value {
    instance
        .invoke_method(interner.intern("ping"), &[])
        .unwrap()
}

#[test]
fn test_instances_survive_a_reload() {
    let interner = SharedInterner::default();
    let mut migrator = KeepAliveMigrator::new(interner.clone());

    let v1 = version(&interner, "world.mod", 1);
    let old_class = service_class(&interner, "World", "v1");
    migrator.register(&v1, old_class.clone());

    let instance = old_class.construct(&[Value::string("alpha")]).unwrap();
    migrator.track(&instance).unwrap();
    assert_eq!(ping(&interner, &instance), Value::string("v1"));

    let v2 = version(&interner, "world.mod", 2);
    let new_class = service_class(&interner, "World", "v2");
    migrator.register(&v2, new_class.clone());
    migrator.module_reloaded(&v1, &v2);

    // Behavior moved, identity and fields stayed.
    assert_eq!(ping(&interner, &instance), Value::string("v2"));
    assert!(instance.class().same(&new_class));
    assert_eq!(
        instance.field(interner.intern("tag")),
        Some(Value::string("alpha"))
    );
}

#[test]
fn test_instances_survive_chained_reloads() {
    let interner = SharedInterner::default();
    let mut migrator = KeepAliveMigrator::new(interner.clone());

    let v1 = version(&interner, "world.mod", 1);
    let c1 = service_class(&interner, "World", "v1");
    migrator.register(&v1, c1.clone());
    let instance = c1.construct(&[]).unwrap();
    migrator.track(&instance).unwrap();

    let v2 = version(&interner, "world.mod", 2);
    let c2 = service_class(&interner, "World", "v2");
    migrator.register(&v2, c2);
    migrator.module_reloaded(&v1, &v2);

    // The tracked set must follow the instance to the second class, or the
    // third reload would miss it.
    let v3 = version(&interner, "world.mod", 3);
    let c3 = service_class(&interner, "World", "v3");
    migrator.register(&v3, c3.clone());
    migrator.module_reloaded(&v2, &v3);

    assert_eq!(ping(&interner, &instance), Value::string("v3"));
    assert!(instance.class().same(&c3));
}

#[test]
fn test_tracking_an_unregistered_class_errors() {
    let interner = SharedInterner::default();
    let mut migrator = KeepAliveMigrator::new(interner.clone());

    let stray = service_class(&interner, "Stray", "v1");
    let instance = stray.construct(&[]).unwrap();

    assert_eq!(
        migrator.track(&instance),
        Err(unregistered_keep_alive("Stray"))
    );
}

#[test]
fn test_an_inserted_class_shifts_the_window() {
    let interner = SharedInterner::default();
    let mut migrator = KeepAliveMigrator::new(interner.clone());

    let v1 = version(&interner, "world.mod", 1);
    let worker_v1 = service_class(&interner, "Worker", "v1");
    migrator.register(&v1, worker_v1.clone());
    let instance = worker_v1.construct(&[]).unwrap();
    migrator.track(&instance).unwrap();

    let v2 = version(&interner, "world.mod", 2);
    let helper = service_class(&interner, "Helper", "helper");
    let worker_v2 = service_class(&interner, "Worker", "v2");
    migrator.register(&v2, helper);
    migrator.register(&v2, worker_v2.clone());
    migrator.module_reloaded(&v1, &v2);

    assert!(instance.class().same(&worker_v2));
    assert_eq!(ping(&interner, &instance), Value::string("v2"));
}

#[test]
fn test_a_removed_class_shifts_the_window() {
    let interner = SharedInterner::default();
    let mut migrator = KeepAliveMigrator::new(interner.clone());

    let v1 = version(&interner, "world.mod", 1);
    let legacy = service_class(&interner, "Legacy", "legacy");
    let worker_v1 = service_class(&interner, "Worker", "v1");
    migrator.register(&v1, legacy.clone());
    migrator.register(&v1, worker_v1.clone());
    let orphan = legacy.construct(&[]).unwrap();
    let kept = worker_v1.construct(&[]).unwrap();
    migrator.track(&orphan).unwrap();
    migrator.track(&kept).unwrap();

    let v2 = version(&interner, "world.mod", 2);
    let worker_v2 = service_class(&interner, "Worker", "v2");
    migrator.register(&v2, worker_v2.clone());
    migrator.module_reloaded(&v1, &v2);

    assert!(kept.class().same(&worker_v2));
    assert_eq!(ping(&interner, &kept), Value::string("v2"));
    // No successor for the removed class: its instances stay as they were.
    assert!(orphan.class().same(&legacy));
    assert_eq!(ping(&interner, &orphan), Value::string("legacy"));
}

#[test]
fn test_a_renamed_class_pairs_positionally() {
    let interner = SharedInterner::default();
    let mut migrator = KeepAliveMigrator::new(interner.clone());

    let v1 = version(&interner, "world.mod", 1);
    let old_class = service_class(&interner, "Worker", "v1");
    migrator.register(&v1, old_class.clone());
    let instance = old_class.construct(&[]).unwrap();
    migrator.track(&instance).unwrap();

    let v2 = version(&interner, "world.mod", 2);
    let renamed = service_class(&interner, "Replacement", "v2");
    migrator.register(&v2, renamed.clone());
    migrator.module_reloaded(&v1, &v2);

    assert!(instance.class().same(&renamed));
    assert_eq!(instance.class_name(), interner.intern("Replacement"));
    assert_eq!(ping(&interner, &instance), Value::string("v2"));
}

#[test]
fn test_unrelated_classes_are_skipped() {
    let interner = SharedInterner::default();
    let mut migrator = KeepAliveMigrator::new(interner.clone());

    // Lookaheads disagree for the leading pair, so it cannot be a rename;
    // the trailing pair lines up once both leads are consumed.
    let v1 = version(&interner, "world.mod", 1);
    let producer = service_class(&interner, "Producer", "producer");
    let sink_a = service_class(&interner, "SinkA", "a");
    migrator.register(&v1, producer.clone());
    migrator.register(&v1, sink_a.clone());
    let stuck = producer.construct(&[]).unwrap();
    let moved = sink_a.construct(&[]).unwrap();
    migrator.track(&stuck).unwrap();
    migrator.track(&moved).unwrap();

    let v2 = version(&interner, "world.mod", 2);
    let consumer = service_class(&interner, "Consumer", "consumer");
    let sink_b = service_class(&interner, "SinkB", "b");
    migrator.register(&v2, consumer);
    migrator.register(&v2, sink_b.clone());
    migrator.module_reloaded(&v1, &v2);

    assert!(stuck.class().same(&producer));
    assert_eq!(ping(&interner, &stuck), Value::string("producer"));
    assert!(moved.class().same(&sink_b));
    assert_eq!(ping(&interner, &moved), Value::string("b"));

    // The skipped class is no longer registered, so it takes no new
    // instances.
    assert_eq!(
        migrator.track(&producer.construct(&[]).unwrap()),
        Err(unregistered_keep_alive("Producer"))
    );
}

#[test]
fn test_a_class_without_successor_stops_tracking() {
    let interner = SharedInterner::default();
    let mut migrator = KeepAliveMigrator::new(interner.clone());

    let v1 = version(&interner, "world.mod", 1);
    let world_v1 = service_class(&interner, "World", "v1");
    let extra = service_class(&interner, "Extra", "extra");
    migrator.register(&v1, world_v1.clone());
    migrator.register(&v1, extra.clone());
    let survivor = world_v1.construct(&[]).unwrap();
    migrator.track(&survivor).unwrap();
    migrator.track(&extra.construct(&[]).unwrap()).unwrap();

    let v2 = version(&interner, "world.mod", 2);
    let world_v2 = service_class(&interner, "World", "v2");
    migrator.register(&v2, world_v2.clone());
    migrator.module_reloaded(&v1, &v2);

    assert!(survivor.class().same(&world_v2));
    // The unmatched trailing class is retired with its version; tracking
    // it again is the unregistered-class error.
    assert_eq!(
        migrator.track(&extra.construct(&[]).unwrap()),
        Err(unregistered_keep_alive("Extra"))
    );
}

#[test]
fn test_a_reload_without_registrations_drops_old_sets() {
    let interner = SharedInterner::default();
    let mut migrator = KeepAliveMigrator::new(interner.clone());

    let v1 = version(&interner, "world.mod", 1);
    let world = service_class(&interner, "World", "v1");
    migrator.register(&v1, world.clone());
    let instance = world.construct(&[]).unwrap();
    migrator.track(&instance).unwrap();

    let v2 = version(&interner, "world.mod", 2);
    migrator.module_reloaded(&v1, &v2);

    // Nothing matched: the instance keeps its class, and the class stops
    // accepting new instances.
    assert!(instance.class().same(&world));
    assert_eq!(ping(&interner, &instance), Value::string("v1"));
    assert_eq!(
        migrator.track(&world.construct(&[]).unwrap()),
        Err(unregistered_keep_alive("World"))
    );
}
