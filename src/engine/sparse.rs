//! Paged sparse-to-dense index sets.
//!
//! A [`SparseSet`] maps the base identifier of a key to a small dense
//! position in O(1), trading a lazily-allocated paged sparse array for a
//! compact dense array that iterates linearly. Dense positions freed by
//! removal are recycled through a free list threaded through the dense array
//! itself.

use crate::engine::error::{DenseLimitError, OffsetLimitError, PageLimitError};
use crate::engine::types::{
    dense_pos_null, ComponentID, DensePos, DEFAULT_PAGE_COUNT_MAX, DEFAULT_PAGE_SIZE,
    MIN_PAGE_SIZE,
};

/// Key type usable with a [`SparseSet`].
///
/// A key is a fixed-width integer value whose low `KEY_BITS - PREFIX_BITS`
/// bits form the *base identifier* used for sparse indexing; the prefix bits
/// are carried through the dense array but ignored by the index. Entity keys
/// put the generation in the prefix so that indexing sees only the slot
/// identifier.
pub trait SparseKey: Copy + PartialEq + 'static {
    /// Total width of the key in bits.
    const KEY_BITS: u32;

    /// Number of high bits ignored by the index. Must be less than
    /// `KEY_BITS`.
    const PREFIX_BITS: u32;

    /// Returns the raw bits of the key, zero-extended to 64 bits.
    fn to_raw(self) -> u64;

    /// Reconstructs a key from raw bits, truncating to `KEY_BITS`.
    fn from_raw(raw: u64) -> Self;

    /// The base identifier: the key's low `KEY_BITS - PREFIX_BITS` bits.
    #[inline]
    fn base_id(self) -> u64 {
        self.to_raw() & (u64::MAX >> (64 - Self::KEY_BITS + Self::PREFIX_BITS))
    }
}

/// Component type indices key the registry's store table directly; the full
/// 32-bit value is the base identifier.
impl SparseKey for ComponentID {
    const KEY_BITS: u32 = ComponentID::BITS;
    const PREFIX_BITS: u32 = 0;

    #[inline]
    fn to_raw(self) -> u64 {
        self as u64
    }

    #[inline]
    fn from_raw(raw: u64) -> Self {
        raw as ComponentID
    }
}

/// Paged sparse-to-dense index over keys of type `K`.
///
/// Invariant:
/// - `live_count() == dense.len() - recycling_count`.
/// - For every live key `k`: `sparse[page(k)][offset(k)] = d` and
///   `dense[d] == k` for some `d < dense.len()`.
/// - Every free dense slot holds the next free slot's position as raw key
///   bits (the list tail holds the null sentinel); no sparse slot points at
///   a free dense slot.
/// - Pages allocate lazily; an absent page reads as all-null.
pub struct SparseSet<K: SparseKey> {
    page_size: usize,
    page_count_max: usize,
    null_pos: DensePos,

    pages: Vec<Option<Vec<DensePos>>>,
    dense: Vec<K>,

    recycling_head: DensePos,
    recycling_count: usize,
}

impl<K: SparseKey> Default for SparseSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SparseKey> SparseSet<K> {
    /// Creates an empty set with the default page layout.
    pub fn new() -> Self {
        Self::with_layout(DEFAULT_PAGE_SIZE, DEFAULT_PAGE_COUNT_MAX)
    }

    /// Creates an empty set with an explicit page layout.
    ///
    /// `page_size` is normalized to the next power of two and to at least
    /// [`MIN_PAGE_SIZE`]. Keys whose base identifier is not below
    /// `page_size * page_count_max` violate the set's contract and abort on
    /// insertion.
    pub fn with_layout(page_size: usize, page_count_max: usize) -> Self {
        let page_size = page_size.next_power_of_two().max(MIN_PAGE_SIZE);
        let null_pos = dense_pos_null(page_size * page_count_max);
        assert!(
            null_pos <= (u64::MAX >> (64 - K::KEY_BITS + K::PREFIX_BITS)),
            "page layout exceeds the key's base identifier range",
        );

        Self {
            page_size,
            page_count_max,
            null_pos,
            pages: vec![None],
            dense: Vec::new(),
            recycling_head: null_pos,
            recycling_count: 0,
        }
    }

    /// Number of slots per sparse page.
    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Cap on the number of sparse pages.
    #[inline]
    pub fn page_count_max(&self) -> usize {
        self.page_count_max
    }

    /// Number of page slots currently tracked (allocated or not).
    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The reserved null dense-position sentinel for this set's layout.
    #[inline]
    pub fn null_pos(&self) -> DensePos {
        self.null_pos
    }

    /// Number of live keys in the set.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.dense.len() - self.recycling_count
    }

    /// Number of dense slots, live and recycled.
    #[inline]
    pub fn total_count(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` if the set holds no live keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live_count() == 0
    }

    #[inline]
    fn page_and_offset(&self, key: K) -> (usize, usize) {
        let base = key.base_id() as usize;
        (base / self.page_size, base & (self.page_size - 1))
    }

    #[inline]
    fn sparse_slot(&self, page: usize, offset: usize) -> DensePos {
        match self.pages.get(page).and_then(Option::as_ref) {
            Some(slots) => slots.get(offset).copied().unwrap_or(self.null_pos),
            None => self.null_pos,
        }
    }

    /// Returns the dense position of `key` if it is live in the set.
    #[inline]
    pub fn position(&self, key: K) -> Option<DensePos> {
        let (page, offset) = self.page_and_offset(key);
        let pos = self.sparse_slot(page, offset);
        if pos != self.null_pos && (pos as usize) < self.dense.len() && self.dense[pos as usize] == key
        {
            Some(pos)
        } else {
            None
        }
    }

    /// Returns `true` if `key` is live in the set.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.position(key).is_some()
    }

    /// Returns `true` if dense slot `pos` holds a live key.
    ///
    /// A recycled slot holds free-list bits, which can coincide with the bit
    /// pattern of some other live key; the round trip through the sparse
    /// index distinguishes the two, because only a live slot maps back to
    /// its own position.
    #[inline]
    pub fn slot_live(&self, pos: DensePos) -> bool {
        let index = pos as usize;
        if index >= self.dense.len() {
            return false;
        }
        let (page, offset) = self.page_and_offset(self.dense[index]);
        self.sparse_slot(page, offset) == pos
    }

    /// Inserts `key` and returns its dense position.
    ///
    /// Recycles a free dense slot when one is available, otherwise appends.
    /// Aborts if the key is already present, if the key's page or offset is
    /// out of the configured layout, or if the dense array is saturated.
    pub fn insert(&mut self, key: K) -> DensePos {
        assert!(!self.contains(key), "key is already in the sparse set");

        let (page, offset) = self.page_and_offset(key);
        self.grow_for(page, offset);

        let pos = if self.recycling_count > 0 {
            let pos = self.recycling_head;
            self.recycling_head = self.dense[pos as usize].to_raw();
            self.recycling_count -= 1;
            self.dense[pos as usize] = key;
            pos
        } else {
            assert!(
                (self.dense.len() as DensePos) < self.null_pos,
                "{}",
                DenseLimitError { occupied: self.dense.len(), sentinel: self.null_pos },
            );
            let pos = self.dense.len() as DensePos;
            self.dense.push(key);
            pos
        };

        self.pages[page].as_mut().unwrap()[offset] = pos;
        pos
    }

    /// Removes `key` from the set. Unknown keys are a no-op.
    ///
    /// The freed dense slot is pushed onto the recycling list by overwriting
    /// its key with the previous list head's raw bits; the dense array never
    /// shuffles.
    pub fn remove(&mut self, key: K) {
        let Some(pos) = self.position(key) else {
            return;
        };
        let (page, offset) = self.page_and_offset(key);

        self.dense[pos as usize] = K::from_raw(self.recycling_head);
        self.recycling_head = pos;
        self.recycling_count += 1;

        self.pages[page].as_mut().unwrap()[offset] = self.null_pos;
    }

    /// The raw dense array, in insertion order.
    ///
    /// Recycled slots appear in this view holding reinterpreted free-list
    /// bits, not real keys; callers must filter through [`slot_live`]
    /// (or use [`live_keys`]) before treating entries as keys.
    ///
    /// [`slot_live`]: SparseSet::slot_live
    /// [`live_keys`]: SparseSet::live_keys
    #[inline]
    pub fn keys(&self) -> &[K] {
        &self.dense
    }

    /// Iterates over the live keys in dense order.
    pub fn live_keys(&self) -> impl Iterator<Item = K> + '_ {
        (0..self.dense.len())
            .filter(|&index| self.slot_live(index as DensePos))
            .map(|index| self.dense[index])
    }

    /// Resets the set to its freshly-constructed state, releasing all pages
    /// and dense storage.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.pages.push(None);
        self.dense.clear();
        self.recycling_head = self.null_pos;
        self.recycling_count = 0;
    }

    /// Grows the page table and target page so `(page, offset)` is writable.
    fn grow_for(&mut self, page: usize, offset: usize) {
        if page >= self.pages.capacity() {
            assert!(
                page < self.page_count_max,
                "{}",
                PageLimitError { page, page_count_max: self.page_count_max },
            );
            let want = (page + 1).next_power_of_two();
            self.pages.reserve(want.saturating_sub(self.pages.len()));
        }

        if page >= self.pages.len() {
            assert!(
                page < self.page_count_max,
                "{}",
                PageLimitError { page, page_count_max: self.page_count_max },
            );
            self.pages.resize_with(page + 1, || None);
        }

        let null_pos = self.null_pos;
        let page_size = self.page_size;
        let slots = self.pages[page].get_or_insert_with(|| vec![null_pos; MIN_PAGE_SIZE]);

        if offset >= slots.capacity() {
            assert!(
                offset < page_size,
                "{}",
                OffsetLimitError { offset, page_size },
            );
            let want = (offset + 1).next_power_of_two();
            slots.reserve(want.saturating_sub(slots.len()));
        }

        if offset >= slots.len() {
            assert!(
                offset < page_size,
                "{}",
                OffsetLimitError { offset, page_size },
            );
            slots.resize(offset + 1, null_pos);
        }
    }
}
