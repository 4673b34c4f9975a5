//! The registry: entity lifecycle, component attachment, and queries over
//! component conjunctions.

use std::any::type_name;

use crate::engine::component::component_index_of;
use crate::engine::entity::{Entity, EntityPool};
use crate::engine::error::StoreTypeMismatchError;
use crate::engine::storage::{TypeErasedStore, TypedStore};
use crate::engine::types::ComponentID;

/// Store table: a typed store of type-erased stores, keyed by component
/// index.
type StoreTable = TypedStore<ComponentID, Box<dyn TypeErasedStore>>;

/// Owns the entity table and one typed store per component type in use.
///
/// All operations are synchronous and must be serialized by the caller; the
/// registry has no internal locking. Expected misses (stale handles, unknown
/// component types) are silent no-ops or `None` returns. Capacity and
/// invariant violations abort.
pub struct Registry {
    entities: EntityPool,
    stores: StoreTable,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { entities: EntityPool::new(), stores: StoreTable::new() }
    }

    // ─── Entity lifecycle ────────────────────────────────────────────────

    /// Creates an entity, recycling a freed slot when one is available.
    pub fn create_entity(&mut self) -> Entity {
        self.entities.allocate(true)
    }

    /// Creates an entity, optionally bypassing slot recycling.
    pub fn create_entity_with(&mut self, recycle_if_available: bool) -> Entity {
        self.entities.allocate(recycle_if_available)
    }

    /// Deletes `entity` and detaches all of its components.
    ///
    /// Stale or unknown handles are a no-op. The slot's generation is bumped
    /// before reuse, so every outstanding handle to the deleted entity goes
    /// stale immediately.
    pub fn delete_entity(&mut self, entity: Entity) {
        if !self.entities.release(entity) {
            return;
        }

        for (_, store) in self.stores.iter_mut() {
            store.remove(entity);
        }
    }

    /// Returns `true` if `entity` is alive.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities.
    #[inline]
    pub fn live_entity_count(&self) -> usize {
        self.entities.live_count()
    }

    /// Number of component stores registered so far.
    #[inline]
    pub fn store_count(&self) -> usize {
        self.stores.live_count()
    }

    // ─── Component access ────────────────────────────────────────────────

    /// Returns the store for component type `T`, if one has been created in
    /// this registry.
    ///
    /// The downcast from the type-erased table is checked; a miss or a type
    /// mismatch yields `None`.
    pub fn store_of<T>(&self) -> Option<&TypedStore<Entity, T>>
    where
        T: Default + Send + Sync + 'static,
    {
        let store = self.stores.get(component_index_of::<T>())?;
        let cast = store.as_any().downcast_ref::<TypedStore<Entity, T>>();
        if cast.is_none() {
            tracing::warn!(
                "{}",
                StoreTypeMismatchError {
                    expected: type_name::<T>(),
                    actual: store.value_type_name(),
                },
            );
        }
        cast
    }

    /// Mutable variant of [`store_of`].
    ///
    /// [`store_of`]: Registry::store_of
    pub fn store_of_mut<T>(&mut self) -> Option<&mut TypedStore<Entity, T>>
    where
        T: Default + Send + Sync + 'static,
    {
        let store = self.stores.get_mut(component_index_of::<T>())?;
        store.as_any_mut().downcast_mut::<TypedStore<Entity, T>>()
    }

    /// Returns the store for component type `T`, creating an empty one under
    /// the type's index on first use.
    pub fn get_or_create_store_of<T>(&mut self) -> &mut TypedStore<Entity, T>
    where
        T: Default + Send + Sync + 'static,
    {
        let index = component_index_of::<T>();
        if !self.stores.contains(index) {
            tracing::debug!(component = type_name::<T>(), index, "registering component store");
            self.stores.add(index, Box::new(TypedStore::<Entity, T>::new()));
        }

        self.stores
            .get_mut(index)
            .and_then(|store| store.as_any_mut().downcast_mut::<TypedStore<Entity, T>>())
            .expect("store registered under its component index")
    }

    /// Borrows the `T` attached to `entity`, if any.
    ///
    /// Stale handles miss: the store's dense entry keeps the full handle, so
    /// a generation mismatch fails the containment check.
    pub fn get<T>(&self, entity: Entity) -> Option<&T>
    where
        T: Default + Send + Sync + 'static,
    {
        self.store_of::<T>()?.get(entity)
    }

    /// Mutably borrows the `T` attached to `entity`, if any.
    pub fn get_mut<T>(&mut self, entity: Entity) -> Option<&mut T>
    where
        T: Default + Send + Sync + 'static,
    {
        self.store_of_mut::<T>()?.get_mut(entity)
    }

    /// Attaches `value` to `entity`, overwriting any existing `T`.
    ///
    /// Dead or stale handles are a no-op, which keeps store membership a
    /// subset of the live entity set.
    pub fn set<T>(&mut self, entity: Entity, value: T)
    where
        T: Default + Send + Sync + 'static,
    {
        if !self.entities.is_alive(entity) {
            return;
        }
        self.get_or_create_store_of::<T>().set(entity, value);
    }

    /// Attaches `value` to `entity` unless a `T` is already attached.
    ///
    /// An existing value is kept; dead or stale handles are a no-op.
    pub fn add<T>(&mut self, entity: Entity, value: T)
    where
        T: Default + Send + Sync + 'static,
    {
        if !self.entities.is_alive(entity) {
            return;
        }
        self.get_or_create_store_of::<T>().add(entity, value);
    }

    /// Detaches the `T` from `entity`, if any.
    pub fn remove<T>(&mut self, entity: Entity)
    where
        T: Default + Send + Sync + 'static,
    {
        if let Some(store) = self.store_of_mut::<T>() {
            store.remove(entity);
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Visits every live `T` in dense order.
    pub fn for_each<T>(&mut self, mut f: impl FnMut(&mut T))
    where
        T: Default + Send + Sync + 'static,
    {
        if let Some(store) = self.store_of_mut::<T>() {
            for (_, value) in store.iter_mut() {
                f(value);
            }
        }
    }

    /// Visits every entity holding both `A` and `B`, exactly once each.
    ///
    /// The store with the smaller live count drives the iteration; its live
    /// entities are snapshotted and filtered before any visit, so the
    /// visitor sees a consistent candidate set.
    pub fn for_each2<A, B>(&mut self, mut f: impl FnMut(&mut A, &mut B))
    where
        A: Default + Send + Sync + 'static,
        B: Default + Send + Sync + 'static,
    {
        let Some(list) =
            self.query_candidates(&[component_index_of::<A>(), component_index_of::<B>()])
        else {
            return;
        };

        let Some(a) = self.store_ptr::<A>() else { return };
        let Some(b) = self.store_ptr::<B>() else { return };

        for entity in list {
            // Distinct component indices mean distinct store allocations, and
            // the visitor has no path back into the registry, so the raw
            // borrows cannot alias or dangle.
            unsafe {
                if let (Some(a), Some(b)) = ((*a).get_mut(entity), (*b).get_mut(entity)) {
                    f(a, b);
                }
            }
        }
    }

    /// Visits every entity holding `A`, `B`, and `C`, exactly once each.
    pub fn for_each3<A, B, C>(&mut self, mut f: impl FnMut(&mut A, &mut B, &mut C))
    where
        A: Default + Send + Sync + 'static,
        B: Default + Send + Sync + 'static,
        C: Default + Send + Sync + 'static,
    {
        let Some(list) = self.query_candidates(&[
            component_index_of::<A>(),
            component_index_of::<B>(),
            component_index_of::<C>(),
        ]) else {
            return;
        };

        let Some(a) = self.store_ptr::<A>() else { return };
        let Some(b) = self.store_ptr::<B>() else { return };
        let Some(c) = self.store_ptr::<C>() else { return };

        for entity in list {
            unsafe {
                if let (Some(a), Some(b), Some(c)) =
                    ((*a).get_mut(entity), (*b).get_mut(entity), (*c).get_mut(entity))
                {
                    f(a, b, c);
                }
            }
        }
    }

    /// Visits every entity holding `A`, `B`, `C`, and `D`, exactly once
    /// each.
    pub fn for_each4<A, B, C, D>(&mut self, mut f: impl FnMut(&mut A, &mut B, &mut C, &mut D))
    where
        A: Default + Send + Sync + 'static,
        B: Default + Send + Sync + 'static,
        C: Default + Send + Sync + 'static,
        D: Default + Send + Sync + 'static,
    {
        let Some(list) = self.query_candidates(&[
            component_index_of::<A>(),
            component_index_of::<B>(),
            component_index_of::<C>(),
            component_index_of::<D>(),
        ]) else {
            return;
        };

        let Some(a) = self.store_ptr::<A>() else { return };
        let Some(b) = self.store_ptr::<B>() else { return };
        let Some(c) = self.store_ptr::<C>() else { return };
        let Some(d) = self.store_ptr::<D>() else { return };

        for entity in list {
            unsafe {
                if let (Some(a), Some(b), Some(c), Some(d)) = (
                    (*a).get_mut(entity),
                    (*b).get_mut(entity),
                    (*c).get_mut(entity),
                    (*d).get_mut(entity),
                ) {
                    f(a, b, c, d);
                }
            }
        }
    }

    /// Snapshots the entities present in every listed store.
    ///
    /// Picks the store with the smallest live count as the driver (ties go
    /// to the first listed), walks its live keys, and retains only entities
    /// contained in every other store. Returns `None` when any listed store
    /// is missing or empty.
    fn query_candidates(&self, indices: &[ComponentID]) -> Option<Vec<Entity>> {
        for (i, a) in indices.iter().enumerate() {
            for b in &indices[i + 1..] {
                assert!(a != b, "component types in a query must be distinct");
            }
        }

        let mut driver: Option<(ComponentID, usize)> = None;
        for &index in indices {
            let store = self.stores.get(index)?;
            let count = store.live_count();
            if count == 0 {
                return None;
            }
            if driver.map_or(true, |(_, smallest)| count < smallest) {
                driver = Some((index, count));
            }
        }
        let (driver_index, _) = driver?;

        let mut list = self.stores.get(driver_index)?.live_entities();
        for &index in indices {
            if index == driver_index {
                continue;
            }
            let store = self.stores.get(index)?;
            list.retain(|&entity| store.contains_entity(entity));
        }

        Some(list)
    }

    fn store_ptr<T>(&mut self) -> Option<*mut TypedStore<Entity, T>>
    where
        T: Default + Send + Sync + 'static,
    {
        let store = self.stores.get_mut(component_index_of::<T>())?;
        let store = store.as_any_mut().downcast_mut::<TypedStore<Entity, T>>()?;
        Some(store as *mut _)
    }
}
