use std::collections::{HashMap, HashSet};

use flint_ecs::{Entity, Registry, SparseKey, SparseSet, TypedStore};

use proptest::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
struct Mass(u64);

#[derive(Clone, Copy, Debug, PartialEq, Default)]
struct Charge(u64);

#[derive(Clone, Copy, Debug, PartialEq, Default)]
struct Spin(u64);

// ─── Handle safety ───────────────────────────────────────────────────────────

proptest! {
    // A handle is alive exactly between its create and its delete; no handle
    // issued before a slot was freed is ever considered alive again.
    #[test]
    fn handle_liveness_tracks_create_and_delete(commands in proptest::collection::vec((any::<bool>(), any::<u8>()), 1..200)) {
        let mut registry = Registry::new();
        let mut model: Vec<(Entity, bool)> = Vec::new();

        for (create, pick) in commands {
            if create || model.iter().all(|(_, alive)| !alive) {
                let entity = registry.create_entity();
                model.push((entity, true));
            } else {
                let live: Vec<usize> = model
                    .iter()
                    .enumerate()
                    .filter(|(_, (_, alive))| *alive)
                    .map(|(i, _)| i)
                    .collect();
                let victim = live[pick as usize % live.len()];
                registry.delete_entity(model[victim].0);
                model[victim].1 = false;
            }
        }

        for (entity, alive) in model {
            prop_assert_eq!(registry.is_alive(entity), alive);
        }
    }
}

// ─── Sparse–dense bijection ──────────────────────────────────────────────────

proptest! {
    // After any add/set/remove sequence, every live key round-trips through
    // the sparse index and the live population matches the model exactly.
    #[test]
    fn store_mirrors_a_map_model(ops in proptest::collection::vec((0u32..48, 0u8..3, any::<u64>()), 1..300)) {
        let mut store: TypedStore<Entity, u64> = TypedStore::new();
        let mut model: HashMap<u32, u64> = HashMap::new();

        for (identifier, op, value) in ops {
            let key = Entity::new(identifier, 0);
            match op {
                0 => {
                    store.add(key, value);
                    model.entry(identifier).or_insert(value);
                }
                1 => {
                    store.set(key, value);
                    model.insert(identifier, value);
                }
                _ => {
                    store.remove(key);
                    model.remove(&identifier);
                }
            }
        }

        prop_assert_eq!(store.live_count(), model.len());
        for (&identifier, &value) in &model {
            prop_assert_eq!(store.get(Entity::new(identifier, 0)), Some(&value));
        }

        let mut seen = HashSet::new();
        for (key, &value) in store.iter() {
            prop_assert!(seen.insert(key.identifier()), "dense slot visited twice");
            prop_assert_eq!(model.get(&key.identifier()), Some(&value));
        }
        prop_assert_eq!(seen.len(), model.len());
    }
}

// ─── Query correctness ───────────────────────────────────────────────────────

proptest! {
    // A two-component query visits exactly the entities holding both
    // components, once each, observing current values.
    #[test]
    fn conjunction_query_visits_the_intersection(membership in proptest::collection::vec((any::<bool>(), any::<bool>()), 1..64)) {
        let mut registry = Registry::new();
        let mut expected = HashSet::new();

        for (has_mass, has_charge) in membership {
            let entity = registry.create_entity();
            if has_mass {
                registry.set(entity, Mass(entity.to_bits()));
            }
            if has_charge {
                registry.set(entity, Charge(entity.to_bits()));
            }
            if has_mass && has_charge {
                expected.insert(entity.to_bits());
            }
        }

        let mut visited = HashSet::new();
        registry.for_each2(|mass: &mut Mass, charge: &mut Charge| {
            assert_eq!(mass.0, charge.0);
            assert!(visited.insert(mass.0), "entity visited twice");
        });

        prop_assert_eq!(visited, expected);
    }
}

// ─── Free-list aliasing ──────────────────────────────────────────────────────

// A recycled dense slot stores the next free position as raw key bits, which
// here collide with a live key's bit pattern; iteration must not be fooled.
#[test]
fn recycled_slot_bits_colliding_with_a_live_key_are_not_iterated() {
    let mut set: SparseSet<Entity> = SparseSet::new();

    for identifier in 0..10u32 {
        set.insert(Entity::new(identifier, 0));
    }
    set.remove(Entity::new(5, 0));
    set.remove(Entity::new(7, 0));
    set.insert(Entity::new(5, 0)); // re-occupies dense slot 7
    set.remove(Entity::new(3, 0)); // frees slot 3, storing raw bits 5

    assert!(set.contains(Entity::new(5, 0)));
    assert_eq!(set.keys()[3], Entity::from_raw(5));

    let live: Vec<Entity> = set.live_keys().collect();
    assert_eq!(live.len(), set.live_count());

    let mut seen = HashSet::new();
    for key in live {
        assert!(seen.insert(key.to_bits()), "key {key:?} yielded twice");
        assert!(set.contains(key));
    }
}

// ─── Handle recycling leaks nothing ──────────────────────────────────────────

#[test]
fn recycled_slot_starts_with_no_components() {
    let mut registry = Registry::new();

    let old = registry.create_entity();
    registry.set(old, Mass(1));
    registry.set(old, Charge(2));
    registry.delete_entity(old);

    let new = registry.create_entity();
    assert_eq!(new.identifier(), old.identifier());
    assert_eq!(registry.get::<Mass>(new), None);
    assert_eq!(registry.get::<Charge>(new), None);
}

// ─── Idempotence ─────────────────────────────────────────────────────────────

#[test]
fn remove_twice_equals_remove_once() {
    let mut registry = Registry::new();
    let entity = registry.create_entity();
    registry.set(entity, Mass(9));

    registry.remove::<Mass>(entity);
    let live_after_one = registry.store_of::<Mass>().unwrap().live_count();
    registry.remove::<Mass>(entity);
    let live_after_two = registry.store_of::<Mass>().unwrap().live_count();

    assert_eq!(live_after_one, 0);
    assert_eq!(live_after_two, 0);
    assert_eq!(registry.get::<Mass>(entity), None);
}

#[test]
fn add_keeps_the_first_value_set_keeps_the_last() {
    let mut registry = Registry::new();
    let entity = registry.create_entity();

    registry.add(entity, Mass(1));
    registry.add(entity, Mass(2));
    assert_eq!(registry.get::<Mass>(entity), Some(&Mass(1)));

    registry.set(entity, Mass(3));
    registry.set(entity, Mass(4));
    assert_eq!(registry.get::<Mass>(entity), Some(&Mass(4)));
}

// ─── Post-removal queries ────────────────────────────────────────────────────

#[test]
fn removed_component_is_not_visited() {
    let mut registry = Registry::new();

    let keep = registry.create_entity();
    registry.set(keep, Spin(1));
    let drop = registry.create_entity();
    registry.set(drop, Spin(2));

    registry.remove::<Spin>(drop);

    let mut visited = Vec::new();
    registry.for_each(|spin: &mut Spin| visited.push(spin.0));
    assert_eq!(visited, vec![1]);
}

#[test]
fn dead_handle_mutations_are_no_ops() {
    let mut registry = Registry::new();

    let entity = registry.create_entity();
    registry.delete_entity(entity);

    registry.set(entity, Mass(5));
    registry.add(entity, Charge(6));
    registry.remove::<Mass>(entity);

    assert_eq!(registry.get::<Mass>(entity), None);
    assert!(registry.store_of::<Mass>().map_or(true, |store| store.is_empty()));
}
