//! Owning storage for the placement modules of one level.

use level_math::Cell;
use tracing::trace;

use crate::actor::ActorType;
use crate::handle::{HandleAllocator, MapHandle};
use crate::map_component::{MapComponent, ModuleSink};

/// Slot arena of [`MapComponent`]s addressed by [`MapHandle`].
///
/// Removing a module bumps its slot generation, so handles held elsewhere
/// (in the registry, in gameplay code) go stale instead of aliasing the next
/// module stored in that slot.
#[derive(Debug, Default)]
pub struct MapComponentArena {
    allocator: HandleAllocator,
    slots: Vec<Option<MapComponent>>,
}

impl MapComponentArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a module and returns its handle.
    pub fn insert(&mut self, module: MapComponent) -> MapHandle {
        let handle = self.allocator.allocate();
        let index = handle.index() as usize;
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(module);
        handle
    }

    /// Removes and returns the module. Stale or invalid handles return `None`.
    pub fn remove(&mut self, handle: MapHandle) -> Option<MapComponent> {
        if !self.allocator.release(handle) {
            return None;
        }
        self.slots
            .get_mut(handle.index() as usize)
            .and_then(Option::take)
    }

    #[must_use]
    pub fn get(&self, handle: MapHandle) -> Option<&MapComponent> {
        if !self.allocator.is_live(handle) {
            return None;
        }
        self.slots.get(handle.index() as usize)?.as_ref()
    }

    #[must_use]
    pub fn get_mut(&mut self, handle: MapHandle) -> Option<&mut MapComponent> {
        if !self.allocator.is_live(handle) {
            return None;
        }
        self.slots.get_mut(handle.index() as usize)?.as_mut()
    }

    #[must_use]
    pub fn contains(&self, handle: MapHandle) -> bool {
        self.get(handle).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.allocator.live_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live modules with the handles that address them, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (MapHandle, &MapComponent)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let module = slot.as_ref()?;
            let handle = self.allocator.live_handle(index as u32)?;
            Some((handle, module))
        })
    }

    /// Drops every module and invalidates every handle.
    pub fn clear(&mut self) {
        self.allocator.clear();
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}

impl ModuleSink for MapComponentArena {
    fn push_cell(&mut self, module: MapHandle, _actor_type: ActorType, cell: Cell) {
        match self.get_mut(module) {
            Some(component) => component.set_cell(cell),
            None => trace!(%module, %cell, "push to stale module ignored"),
        }
    }
}
