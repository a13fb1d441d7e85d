use super::*;
use molt_value::Value;
use pretty_assertions::assert_eq;

fn named(raw: u32) -> Name {
    Name::from_raw(raw)
}

fn seeded(names: &[Name]) -> NameRegistry {
    names
        .iter()
        .map(|&name| (name, Handle::new(name, Value::int(i64::from(name.raw())))))
        .collect()
}

#[test]
fn test_first_evaluation_is_unchanged() {
    let mut registry = NameRegistry::default();
    let outcome = update_registry(&mut registry, &[named(1), named(2)]);

    assert_eq!(outcome, RegistryUpdate::Unchanged);
    assert!(registry.is_empty());
}

#[test]
fn test_rename_moves_handle_and_drops_old_key() {
    let (a, b, c) = (named(1), named(2), named(3));
    let mut registry = seeded(&[a, b]);
    let moved = registry[&b].clone();

    let outcome = update_registry(&mut registry, &[a, c]);

    assert_eq!(outcome, RegistryUpdate::Renamed { from: b, to: c });
    assert!(!registry.contains_key(&b));
    assert!(registry[&c].same(&moved));
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_multiple_additions_with_removal_is_ambiguous() {
    let (a, b, c, d, e) = (named(1), named(2), named(3), named(4), named(5));
    let mut registry = seeded(&[a, b, c]);
    let before: Vec<Name> = registry.keys().copied().collect();

    let outcome = update_registry(&mut registry, &[a, d, e]);

    assert_eq!(outcome, RegistryUpdate::Ambiguous);
    let mut after: Vec<Name> = registry.keys().copied().collect();
    let mut expected = before;
    after.sort_unstable();
    expected.sort_unstable();
    assert_eq!(after, expected);
}

#[test]
fn test_one_addition_multiple_removals_is_ambiguous() {
    let (a, b, c, d) = (named(1), named(2), named(3), named(4));
    let mut registry = seeded(&[a, b, c]);

    let outcome = update_registry(&mut registry, &[a, d]);

    assert_eq!(outcome, RegistryUpdate::Ambiguous);
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_pure_removal_drops_entries() {
    let (a, b, c) = (named(1), named(2), named(3));
    let mut registry = seeded(&[a, b, c]);
    let kept = registry[&a].clone();

    let outcome = update_registry(&mut registry, &[a]);

    assert_eq!(outcome, RegistryUpdate::Removed(2));
    assert_eq!(registry.len(), 1);
    assert!(registry[&a].same(&kept));
}

#[test]
fn test_pure_addition_leaves_registry_alone() {
    let (a, b) = (named(1), named(2));
    let mut registry = seeded(&[a]);

    let outcome = update_registry(&mut registry, &[a, b]);

    assert_eq!(outcome, RegistryUpdate::Unchanged);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_duplicate_names_do_not_fake_ambiguity() {
    let (a, b) = (named(1), named(2));
    let mut registry = seeded(&[a]);

    let outcome = update_registry(&mut registry, &[a, b, b]);

    assert_eq!(outcome, RegistryUpdate::Unchanged);
}

#[test]
fn test_second_run_of_same_names_is_unchanged() {
    let (a, b, c) = (named(1), named(2), named(3));
    let mut registry = seeded(&[a, b]);

    assert_eq!(
        update_registry(&mut registry, &[a, c]),
        RegistryUpdate::Renamed { from: b, to: c }
    );
    assert_eq!(
        update_registry(&mut registry, &[a, c]),
        RegistryUpdate::Unchanged
    );
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn snapshot(registry: &NameRegistry) -> Vec<(Name, Handle)> {
        let mut entries: Vec<(Name, Handle)> = registry
            .iter()
            .map(|(&name, handle)| (name, handle.clone()))
            .collect();
        entries.sort_unstable_by_key(|(name, _)| *name);
        entries
    }

    fn same_entries(a: &[(Name, Handle)], b: &[(Name, Handle)]) -> bool {
        a.len() == b.len()
            && a.iter()
                .zip(b)
                .all(|((an, ah), (bn, bh))| an == bn && ah.same(bh))
    }

    proptest! {
        #[test]
        fn registry_never_grows_and_never_mints_handles(
            old in proptest::collection::btree_set(0u32..12, 0..6),
            new in proptest::collection::btree_set(0u32..12, 0..6),
        ) {
            let old_names: Vec<Name> = old.iter().map(|&n| Name::from_raw(n)).collect();
            let new_names: Vec<Name> = new.iter().map(|&n| Name::from_raw(n)).collect();

            let mut registry = seeded(&old_names);
            let originals = snapshot(&registry);

            update_registry(&mut registry, &new_names);

            prop_assert!(registry.len() <= old_names.len());
            for (name, handle) in snapshot(&registry) {
                // every key is either an old key or one of the new names
                prop_assert!(
                    old_names.contains(&name) || new_names.contains(&name)
                );
                // every handle existed before the update
                prop_assert!(originals.iter().any(|(_, original)| original.same(&handle)));
            }
        }

        #[test]
        fn applying_the_same_names_twice_is_idempotent(
            old in proptest::collection::btree_set(0u32..12, 0..6),
            new in proptest::collection::btree_set(0u32..12, 0..6),
        ) {
            let old_names: Vec<Name> = old.iter().map(|&n| Name::from_raw(n)).collect();
            let new_names: Vec<Name> = new.iter().map(|&n| Name::from_raw(n)).collect();

            let mut registry = seeded(&old_names);
            update_registry(&mut registry, &new_names);
            let first = snapshot(&registry);

            update_registry(&mut registry, &new_names);
            let second = snapshot(&registry);

            prop_assert!(same_entries(&first, &second));
        }
    }
}
