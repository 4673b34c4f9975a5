//! # Component Type Identity
//!
//! This module assigns stable, process-unique indices to component types.
//!
//! ## Purpose
//! A registry keys its store table by a compact integer rather than by
//! `TypeId`, so component lookup is a sparse-set probe instead of a hash.
//! The index for a type is assigned on first use, monotonically from 0, and
//! never changes for the lifetime of the process.
//!
//! ## Design
//! - A global table maps `TypeId -> ComponentID` and keeps a
//!   [`ComponentInfo`] descriptor per assigned index.
//! - Indices come from an atomic monotonic counter; assignment is serialized
//!   under the table's write lock, so an index is handed out exactly once.
//! - Every registry in the process shares the mapping. This is sound because
//!   each registry owns its own store table keyed by these indices.
//!
//! ## Concurrency
//! Constructing type indices from multiple threads is safe even though
//! operating on any one registry is not.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::engine::types::ComponentID;

/// Describes a component type that has been assigned an index.
///
/// ## Fields
/// - `index`: the process-unique identifier assigned on first use.
/// - `name`: the Rust type name (`type_name::<T>()`), for diagnostics.
/// - `type_id`: the runtime `TypeId` of the component type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentInfo {
    /// Process-unique index assigned to this component type.
    pub index: ComponentID,

    /// Rust type name, for diagnostics.
    pub name: &'static str,

    /// Runtime `TypeId` of the component type.
    pub type_id: TypeId,
}

impl fmt::Display for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentInfo {{ index: {}, name: {} }}", self.index, self.name)
    }
}

struct TypeIndexTable {
    by_type: HashMap<TypeId, ComponentID>,
    infos: Vec<ComponentInfo>,
}

static NEXT_INDEX: AtomicU32 = AtomicU32::new(0);
static TABLE: OnceLock<RwLock<TypeIndexTable>> = OnceLock::new();

fn table() -> &'static RwLock<TypeIndexTable> {
    TABLE.get_or_init(|| {
        RwLock::new(TypeIndexTable { by_type: HashMap::new(), infos: Vec::new() })
    })
}

/// Returns the process-unique index for component type `T`, assigning one on
/// first use.
///
/// ## Behavior
/// - Repeat calls for the same type return the same index, from any thread.
/// - Indices are assigned monotonically from 0 in first-use order.
pub fn component_index_of<T: 'static>() -> ComponentID {
    let type_id = TypeId::of::<T>();

    {
        let table = table().read().unwrap_or_else(PoisonError::into_inner);
        if let Some(&index) = table.by_type.get(&type_id) {
            return index;
        }
    }

    let mut table = table().write().unwrap_or_else(PoisonError::into_inner);
    if let Some(&index) = table.by_type.get(&type_id) {
        return index;
    }

    let index = NEXT_INDEX.fetch_add(1, Ordering::Relaxed);
    debug_assert_eq!(index as usize, table.infos.len());

    table.by_type.insert(type_id, index);
    table.infos.push(ComponentInfo { index, name: type_name::<T>(), type_id });

    tracing::debug!(component = type_name::<T>(), index, "assigned component type index");
    index
}

/// Returns the descriptor for an assigned component index, if any.
pub fn component_info(index: ComponentID) -> Option<ComponentInfo> {
    let table = table().read().unwrap_or_else(PoisonError::into_inner);
    table.infos.get(index as usize).copied()
}

/// Number of component types assigned an index so far in this process.
pub fn registered_component_count() -> usize {
    let table = table().read().unwrap_or_else(PoisonError::into_inner);
    table.infos.len()
}
