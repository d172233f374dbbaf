//! Map component handles and their allocation.
//!
//! A [`MapHandle`] is an arena index plus a generation. The generation is
//! bumped every time a slot is freed, so a handle to a destroyed module never
//! matches the module that later reuses its slot.

use serde::{Deserialize, Serialize};

/// A non-owning reference to a [`MapComponent`](crate::MapComponent) in a
/// [`MapComponentArena`](crate::MapComponentArena).
///
/// Handles are plain values: copying one does not keep the module alive, and
/// a stale handle simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapHandle {
    index: u32,
    generation: u32,
}

impl MapHandle {
    /// The null handle. Generation zero is never handed out.
    pub const INVALID: MapHandle = MapHandle {
        index: u32::MAX,
        generation: 0,
    };

    /// Build a handle from its raw parts.
    #[must_use]
    pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the arena.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when the handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Returns `true` unless this is the null handle.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.generation != 0 && self.index != u32::MAX
    }
}

impl Default for MapHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl std::fmt::Display for MapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MapHandle({}v{})", self.index, self.generation)
    }
}

/// Issues [`MapHandle`]s and recycles freed slots.
///
/// Freed indices go on a free list and are reused with a bumped generation.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    /// Current generation per slot.
    generations: Vec<u32>,
    /// Indices available for reuse.
    free: Vec<u32>,
    /// Number of live handles.
    live: usize,
}

impl HandleAllocator {
    /// Creates an allocator with no slots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh handle, reusing a freed slot when one is available.
    pub fn allocate(&mut self) -> MapHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let generation = self.generations[index as usize];
            return MapHandle::from_raw_parts(index, generation);
        }

        let index = self.generations.len() as u32;
        self.generations.push(1);
        MapHandle::from_raw_parts(index, 1)
    }

    /// Frees a handle. Returns `false` if it was not live.
    pub fn release(&mut self, handle: MapHandle) -> bool {
        if !self.is_live(handle) {
            return false;
        }

        let slot = &mut self.generations[handle.index() as usize];
        // Skip zero on wrap-around so a recycled slot never issues INVALID.
        *slot = slot.wrapping_add(1).max(1);
        self.free.push(handle.index());
        self.live -= 1;
        true
    }

    /// Returns `true` if the handle was issued by this allocator and has not
    /// been released since.
    #[must_use]
    pub fn is_live(&self, handle: MapHandle) -> bool {
        handle.is_valid()
            && self
                .generations
                .get(handle.index() as usize)
                .is_some_and(|&generation| generation == handle.generation())
            && !self.free.contains(&handle.index())
    }

    /// The handle currently live at `index`, if any.
    #[must_use]
    pub fn live_handle(&self, index: u32) -> Option<MapHandle> {
        let generation = *self.generations.get(index as usize)?;
        let handle = MapHandle::from_raw_parts(index, generation);
        self.is_live(handle).then_some(handle)
    }

    /// Number of live handles.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Frees every slot and bumps every generation, so all previously issued
    /// handles go stale.
    pub fn clear(&mut self) {
        for generation in &mut self.generations {
            *generation = generation.wrapping_add(1).max(1);
        }
        self.free = (0..self.generations.len() as u32).rev().collect();
        self.live = 0;
    }
}
