//! Typed component storage over sparse-set indexing.
//!
//! A [`TypedStore`] pairs a [`SparseSet`] with a parallel dense array of
//! component values: the value for a live key always sits at the key's dense
//! position. Removal recycles dense slots through the set's free list and
//! resets the vacated value, so components that own resources release them
//! promptly instead of lingering until the slot is reused.

use std::any::{type_name, Any, TypeId};

use crate::engine::entity::Entity;
use crate::engine::sparse::{SparseKey, SparseSet};
use crate::engine::types::DensePos;

/// Type-erased surface of an entity-keyed [`TypedStore`].
///
/// The registry stores every component store behind this trait and recovers
/// the concrete type with a checked downcast through [`as_any`]; the
/// type-identity accessors back that check and feed diagnostics.
///
/// [`as_any`]: TypeErasedStore::as_any
pub trait TypeErasedStore: Any + Send + Sync {
    /// Number of live entities in the store.
    fn live_count(&self) -> usize;

    /// Number of dense slots, live and recycled.
    fn total_count(&self) -> usize;

    /// `TypeId` of the key type.
    fn key_type_id(&self) -> TypeId;

    /// `TypeId` of the stored component type.
    fn value_type_id(&self) -> TypeId;

    /// Component type name, for diagnostics.
    fn value_type_name(&self) -> &'static str;

    /// Returns `true` if the store holds a value for `entity`.
    fn contains_entity(&self, entity: Entity) -> bool;

    /// Snapshots the live entities in dense order.
    fn live_entities(&self) -> Vec<Entity>;

    /// Detaches the value for `entity`, if any.
    fn remove(&mut self, entity: Entity);

    /// Resets the store to empty.
    fn clear(&mut self);

    /// Upcast for checked downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for checked downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Sparse-set-indexed dense array of `T` keyed by `K`.
///
/// Invariant:
/// - `values.len() == index.total_count()` at all times.
/// - For every live key at dense position `d`, `values[d]` is the attached
///   value.
/// - For every recycled position `d`, `values[d]` is a default-constructed
///   placeholder left behind by [`remove`]; iteration never exposes it.
///
/// [`remove`]: TypedStore::remove
pub struct TypedStore<K: SparseKey, T> {
    index: SparseSet<K>,
    values: Vec<T>,
}

impl<K: SparseKey, T> Default for TypedStore<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SparseKey, T> TypedStore<K, T> {
    /// Creates an empty store with the default page layout.
    pub fn new() -> Self {
        Self { index: SparseSet::new(), values: Vec::new() }
    }

    /// Creates an empty store with an explicit sparse page layout.
    pub fn with_layout(page_size: usize, page_count_max: usize) -> Self {
        Self { index: SparseSet::with_layout(page_size, page_count_max), values: Vec::new() }
    }

    /// Number of live keys in the store.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.index.live_count()
    }

    /// Number of dense slots, live and recycled.
    #[inline]
    pub fn total_count(&self) -> usize {
        self.index.total_count()
    }

    /// Returns `true` if the store holds no live keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of sparse page slots currently tracked.
    #[inline]
    pub fn page_count(&self) -> usize {
        self.index.page_count()
    }

    /// Returns `true` if `key` has a value attached.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.index.contains(key)
    }

    /// Returns the dense position of `key`, if live.
    #[inline]
    pub fn position(&self, key: K) -> Option<DensePos> {
        self.index.position(key)
    }

    /// Borrows the value attached to `key`, if any.
    #[inline]
    pub fn get(&self, key: K) -> Option<&T> {
        self.index.position(key).map(|pos| &self.values[pos as usize])
    }

    /// Mutably borrows the value attached to `key`, if any.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.index.position(key).map(|pos| &mut self.values[pos as usize])
    }

    /// Attaches `value` to `key`, overwriting any existing value.
    pub fn set(&mut self, key: K, value: T) {
        match self.index.position(key) {
            Some(pos) => self.values[pos as usize] = value,
            None => self.insert_value(key, value),
        }
    }

    /// Attaches `value` to `key` unless a value is already attached.
    ///
    /// An existing value is kept untouched; the new one is dropped.
    pub fn add(&mut self, key: K, value: T) {
        if self.index.contains(key) {
            return;
        }
        self.insert_value(key, value);
    }

    fn insert_value(&mut self, key: K, value: T) {
        let pos = self.index.insert(key) as usize;
        assert!(pos <= self.values.len(), "insert reported an unbacked dense position");

        if pos == self.values.len() {
            self.values.push(value);
        } else {
            self.values[pos] = value;
        }
    }

    /// The raw dense value array, in dense order.
    ///
    /// Recycled slots appear in this view holding reset placeholder values;
    /// pair with [`keys`] and filter, or use [`iter`], to see live values
    /// only.
    ///
    /// [`keys`]: TypedStore::keys
    /// [`iter`]: TypedStore::iter
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable access to the raw dense value array.
    #[inline]
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// The raw dense key array; see [`SparseSet::keys`] for the recycled-slot
    /// caveat.
    #[inline]
    pub fn keys(&self) -> &[K] {
        self.index.keys()
    }

    /// Iterates over live `(key, value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        let index = &self.index;
        self.values
            .iter()
            .enumerate()
            .filter(move |(pos, _)| index.slot_live(*pos as DensePos))
            .map(move |(pos, value)| (index.keys()[pos], value))
    }

    /// Iterates over live `(key, value)` pairs with mutable value access.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> {
        let index = &self.index;
        self.values
            .iter_mut()
            .enumerate()
            .filter(move |(pos, _)| index.slot_live(*pos as DensePos))
            .map(move |(pos, value)| (index.keys()[pos], value))
    }
}

impl<K: SparseKey, T: Default> TypedStore<K, T> {
    /// Detaches the value for `key`. Unknown keys are a no-op.
    ///
    /// The vacated dense slot keeps a default-constructed placeholder so the
    /// detached value's resources are released before this call returns.
    pub fn remove(&mut self, key: K) {
        let Some(pos) = self.index.position(key) else {
            return;
        };
        self.index.remove(key);
        self.values[pos as usize] = T::default();
    }

    /// Resets the store to empty, dropping every value and releasing the
    /// sparse pages.
    pub fn clear(&mut self) {
        self.index.clear();
        self.values.clear();
    }
}

impl<T: Default + Send + Sync + 'static> TypeErasedStore for TypedStore<Entity, T> {
    fn live_count(&self) -> usize {
        TypedStore::live_count(self)
    }

    fn total_count(&self) -> usize {
        TypedStore::total_count(self)
    }

    fn key_type_id(&self) -> TypeId {
        TypeId::of::<Entity>()
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn live_entities(&self) -> Vec<Entity> {
        self.index.live_keys().collect()
    }

    fn remove(&mut self, entity: Entity) {
        TypedStore::remove(self, entity);
    }

    fn clear(&mut self) {
        TypedStore::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
