//! Type-safe generational handles
//!
//! Handles name a value without pointing at it. The lower 24 bits hold the
//! slot index and the upper 8 bits a generation counter that is bumped every
//! time the slot is freed, so a handle kept past its value's lifetime is
//! detected instead of silently aliasing whatever reused the slot. A slot
//! whose generation has run out is retired rather than wrapped.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

const INDEX_BITS: u32 = 24;
const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;

/// A type-safe handle to a value of type `T`
#[repr(transparent)]
pub struct Handle<T> {
    bits: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Largest slot index a map hands out. The all-ones index is left
    /// unused so no live handle can pack to [`null`](Self::null).
    pub const MAX_INDEX: u32 = INDEX_MASK - 1;

    /// Pack an index and a generation
    #[inline]
    pub const fn new(index: u32, generation: u8) -> Self {
        debug_assert!(index <= INDEX_MASK);
        Self::from_bits((generation as u32) << INDEX_BITS | (index & INDEX_MASK))
    }

    /// The handle that never names anything
    #[inline]
    pub const fn null() -> Self {
        Self::from_bits(u32::MAX)
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        self.bits == u32::MAX
    }

    /// Slot index
    #[inline]
    pub const fn index(&self) -> u32 {
        self.bits & INDEX_MASK
    }

    /// Generation the slot had when this handle was issued
    #[inline]
    pub const fn generation(&self) -> u8 {
        (self.bits >> INDEX_BITS) as u8
    }

    /// Raw packed value
    #[inline]
    pub const fn to_bits(&self) -> u32 {
        self.bits
    }

    /// Rebuild a handle from [`to_bits`](Self::to_bits)
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            bits,
            _marker: PhantomData,
        }
    }
}

// Written by hand so `T` needs no bounds
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bits.cmp(&other.bits)
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = std::any::type_name::<T>();
        let name = full.rsplit("::").next().unwrap_or(full);
        write!(f, "Handle<{}>({})", name, self)
    }
}

#[cfg(feature = "serde")]
impl<T> serde::Serialize for Handle<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for Handle<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <u32 as serde::Deserialize>::deserialize(deserializer).map(Self::from_bits)
    }
}

/// One storage slot: the generation it is on and what it holds
struct Entry<T> {
    generation: u8,
    value: Option<T>,
}

/// Values addressed by the handles the map hands out
///
/// Freed slots are reused last-in first-out with their generation bumped,
/// so a removed value's handle never reaches the value that replaced it.
/// A slot freed on its last generation is never reused.
pub struct HandleMap<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> HandleMap<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Store a value
    ///
    /// # Panics
    ///
    /// Panics when the map runs out of slot indices, live or retired.
    pub fn insert(&mut self, value: T) -> Handle<T> {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.value = Some(value);
            return Handle::new(index, entry.generation);
        }

        let index = self.entries.len() as u32;
        assert!(index <= Handle::<T>::MAX_INDEX, "handle space exhausted");
        self.entries.push(Entry {
            generation: 0,
            value: Some(value),
        });
        Handle::new(index, 0)
    }

    /// Take a value out, retiring its handle
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let entry = self.entry_mut(handle)?;
        let value = entry.value.take()?;
        let reusable = match entry.generation.checked_add(1) {
            Some(next) => {
                entry.generation = next;
                true
            }
            // Out of generations: the slot stays empty for good
            None => false,
        };
        if reusable {
            self.free.push(handle.index());
        }
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.entry(handle)?.value.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.entry_mut(handle)?.value.as_mut()
    }

    /// Check if the handle still names a value
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live values with their handles, in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.entries.iter().enumerate().filter_map(|(index, entry)| {
            let value = entry.value.as_ref()?;
            Some((Handle::new(index as u32, entry.generation), value))
        })
    }

    fn entry(&self, handle: Handle<T>) -> Option<&Entry<T>> {
        if handle.is_null() {
            return None;
        }
        self.entries
            .get(handle.index() as usize)
            .filter(|entry| entry.generation == handle.generation())
    }

    fn entry_mut(&mut self, handle: Handle<T>) -> Option<&mut Entry<T>> {
        if handle.is_null() {
            return None;
        }
        self.entries
            .get_mut(handle.index() as usize)
            .filter(|entry| entry.generation == handle.generation())
    }
}

impl<T> Default for HandleMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for HandleMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
