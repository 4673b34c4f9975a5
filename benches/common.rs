#![allow(dead_code)]

use flint_ecs::{Entity, Registry};

// The default sparse page layout addresses 65,536 base identifiers per
// store, so the bench populations stay under that bound.
pub const AGENTS_SMALL: usize = 10_000;
pub const AGENTS_MED: usize = 50_000;

#[derive(Clone, Copy, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Default)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Clone, Copy, Default)]
pub struct Wealth {
    pub value: f32,
}

pub fn make_world(agent_count: usize) -> (Registry, Vec<Entity>) {
    let mut registry = Registry::new();
    let entities = populate(&mut registry, agent_count);
    (registry, entities)
}

/// Every agent gets a position and wealth; every other agent also moves.
pub fn populate(registry: &mut Registry, agent_count: usize) -> Vec<Entity> {
    (0..agent_count)
        .map(|i| {
            let entity = registry.create_entity();
            registry.set(entity, Position { x: i as f32, y: 0.0 });
            registry.set(entity, Wealth { value: 100.0 });
            if i % 2 == 0 {
                registry.set(entity, Velocity { dx: 1.0, dy: 1.0 });
            }
            entity
        })
        .collect()
}
