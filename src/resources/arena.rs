//! Slot Arena
//!
//! A pure logical structure that does not hold GPU state; it only manages
//! slot indices. Freed slots go onto a free list and are handed out again,
//! most-recently-freed first, so a registry seeing heavy churn (streaming
//! geometry, per-frame transient buffers) stays bounded by its peak size.

use std::fmt;

/// Stable per-device identifier of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(u32);

impl SlotIndex {
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-list backed arena with O(1) insert and remove.
#[derive(Debug, Clone)]
pub struct SlotArena<T> {
    entries: Vec<Option<T>>,
    /// Vacant slots; `pop()` hands out the most recently freed one.
    free_list: Vec<u32>,
    len: usize,
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotArena<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Stores `value`, recycling a freed slot when one is available.
    pub fn insert(&mut self, value: T) -> SlotIndex {
        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            self.entries[index as usize] = Some(value);
            return SlotIndex(index);
        }

        let index = self.entries.len();
        if index > 0 && index.is_power_of_two() {
            log::debug!("SlotArena growing past {index} slots");
        }
        self.entries.push(Some(value));
        SlotIndex(index as u32)
    }

    /// Removes the value at `index`, freeing the slot for reuse.
    pub fn remove(&mut self, index: SlotIndex) -> Option<T> {
        let value = self.entries.get_mut(index.as_usize())?.take()?;
        self.free_list.push(index.0);
        self.len -= 1;
        Some(value)
    }

    #[must_use]
    pub fn get(&self, index: SlotIndex) -> Option<&T> {
        self.entries.get(index.as_usize())?.as_ref()
    }

    pub fn get_mut(&mut self, index: SlotIndex) -> Option<&mut T> {
        self.entries.get_mut(index.as_usize())?.as_mut()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, index: SlotIndex) -> bool {
        self.get(index).is_some()
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots ever allocated (occupied + free).
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|v| (SlotIndex(i as u32), v)))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.free_list.clear();
        self.len = 0;
    }
}
