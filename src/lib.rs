//! # Flint ECS
//!
//! Sparse-set entity–component registry for simulation and game engines.
//!
//! ## Design Goals
//! - O(1) attach/detach/lookup through paged sparse-to-dense indexing
//! - Linear, cache-friendly iteration over component conjunctions
//! - Generational entity handles with O(1) stale-reference detection
//! - Open component registration keyed by process-unique type indices
//!
//! A [`Registry`] hands out [`Entity`] handles, attaches values of any
//! `Default + Send + Sync` component type to them, and iterates entities
//! holding a stated set of component types:
//!
//! ```
//! use flint_ecs::Registry;
//!
//! #[derive(Clone, Copy, Default)]
//! struct Position { x: f32, y: f32 }
//! #[derive(Clone, Copy, Default)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut registry = Registry::new();
//!
//! let ball = registry.create_entity();
//! registry.set(ball, Position { x: 0.0, y: 0.0 });
//! registry.set(ball, Velocity { dx: 1.0, dy: 2.0 });
//!
//! registry.for_each2(|position: &mut Position, velocity: &mut Velocity| {
//!     position.x += velocity.dx;
//!     position.y += velocity.dy;
//! });
//! ```

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

// Core registry types

pub use engine::registry::Registry;

pub use engine::entity::{
    Entity,
    EntityPool,
};

// Storage layers

pub use engine::sparse::{
    SparseKey,
    SparseSet,
};

pub use engine::storage::{
    TypeErasedStore,
    TypedStore,
};

// Component type identity

pub use engine::component::{
    component_index_of,
    component_info,
    registered_component_count,
    ComponentInfo,
};

// Identifier types and layout constants

pub use engine::types::{
    ComponentID,
    DensePos,
    EntityID,
    GenerationID,
    SlotID,
    DEFAULT_PAGE_COUNT_MAX,
    DEFAULT_PAGE_SIZE,
    MIN_PAGE_SIZE,
};
