//! Core Identifier Types and Bit-Level Layouts
//!
//! This module defines the **fundamental types, identifiers, bit layouts, and
//! capacity constants** shared by every layer of the data engine: the sparse
//! index, typed component stores, the entity pool, and the registry.
//!
//! ## Design Philosophy
//!
//! The engine is designed around:
//!
//! - **Dense storage** indexed through paged sparse maps,
//! - **Stable numeric identifiers** for entities and component types,
//! - **Generational handles** for O(1) stale-reference detection,
//! - No heap allocation in hot paths beyond amortized vector growth.
//!
//! ## Entity Representation
//!
//! Entities are encoded as a packed 64-bit integer with the following layout:
//!
//! ```text
//! | generation | identifier |
//! ```
//!
//! - **Identifier** (low 32 bits) is the slot index into the entity table.
//! - **Generation** (high 32 bits) is bumped when a slot is freed, so every
//!   handle issued before the free compares unequal to the slot's current
//!   occupant.
//!
//! The bit widths are pinned by compile-time constants and validated with
//! static assertions.
//!
//! ## Dense Positions
//!
//! A [`DensePos`] addresses a slot in a store's dense array. Each store
//! reserves a null sentinel for its sparse pages: the all-ones pattern of the
//! narrowest of 16, 32, or 64 bits that holds the store's addressable
//! capacity (`page_size * page_count_max`). The sentinel is never a valid
//! dense position, which bounds the live count of a single store.

/// Bit-width type used for compile-time layout calculations.
pub type Bits = u8;

/// Packed 64-bit entity value: generation in the high bits, slot identifier
/// in the low bits.
pub type EntityID = u64;
/// Slot index into the entity table (low half of an [`EntityID`]).
pub type SlotID = u32;
/// Reuse counter for an entity slot (high half of an [`EntityID`]).
pub type GenerationID = u32;

/// Process-unique index assigned to a component type on first use.
pub type ComponentID = u32;

/// Index into a store's dense array.
pub type DensePos = u64;

/// Total number of bits in an [`EntityID`].
pub const ENTITY_BITS: Bits = 64;
/// Number of bits reserved for the slot generation.
pub const GENERATION_BITS: Bits = 32;
/// Number of bits reserved for the slot identifier.
pub const IDENTIFIER_BITS: Bits = ENTITY_BITS - GENERATION_BITS;

const _: [(); 1] = [(); (GENERATION_BITS < ENTITY_BITS) as usize];
const _: [(); 1] = [(); (IDENTIFIER_BITS > 0) as usize];
const _: [(); 1] = [(); (IDENTIFIER_BITS as u32 == SlotID::BITS) as usize];
const _: [(); 1] = [(); (GENERATION_BITS as u32 == GenerationID::BITS) as usize];

const fn mask(bits: Bits) -> EntityID {
    if bits == 0 { 0 } else { ((1 as EntityID) << bits) - 1 }
}

/// Mask selecting the identifier portion of an [`EntityID`].
pub const IDENTIFIER_MASK: EntityID = mask(IDENTIFIER_BITS);
/// Mask selecting the generation portion of an [`EntityID`] once shifted down.
pub const GENERATION_MASK: EntityID = mask(GENERATION_BITS);

/// Smallest sparse page allocation, in slots.
pub const MIN_PAGE_SIZE: usize = 8;
/// Default number of slots per sparse page.
pub const DEFAULT_PAGE_SIZE: usize = 4096;
/// Default cap on the number of sparse pages per store.
pub const DEFAULT_PAGE_COUNT_MAX: usize = 16;

/// Returns the null dense-position sentinel for a store that can address
/// `capacity` keys: the all-ones pattern of the narrowest of 16, 32, or 64
/// bits that holds `capacity`.
///
/// The sentinel is reserved; a store's dense array may never grow up to it.
pub const fn dense_pos_null(capacity: usize) -> DensePos {
    if capacity <= u16::MAX as usize {
        u16::MAX as DensePos
    } else if capacity <= u32::MAX as usize {
        u32::MAX as DensePos
    } else {
        u64::MAX
    }
}
