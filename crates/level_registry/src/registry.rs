//! The authoritative placement registry.
//!
//! [`MapRegistry`] is an ordered list of [`RegistryEntry`]s plus the
//! bookkeeping delta replication needs: a replication id per entry, a key
//! bumped on every change to that entry, and an array version bumped on
//! every change at all.

use std::fmt;
use std::ops::Deref;

use level_component::{ActorTypeMask, MapComponentArena, MapHandle, ModuleSink};
use level_math::{Cell, Cells};
use tracing::{debug, info};

use crate::delta::{Baseline, RegistryDelta, ReplicatedItem};
use crate::entry::RegistryEntry;
use crate::events::{RegistryEvent, SubscriptionId};
use crate::iter::ModuleIter;

type Subscriber = Box<dyn FnMut(&RegistryEvent) + Send>;

/// Which module occupies which cell, for one level.
///
/// Holds non-owning [`MapHandle`]s into the level's [`MapComponentArena`].
/// At most one entry exists per module.
#[derive(Default)]
pub struct MapRegistry {
    items: Vec<RegistryEntry>,
    /// Last replication id handed out. Ids start at 1 and are never reused.
    id_counter: u32,
    array_version: u64,
    dirty: bool,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u32,
}

impl MapRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds or adds the entry for `handle`.
    ///
    /// A new entry takes the module's current cell and actor type from the
    /// arena. Passing a handle that is invalid or not live in `arena` is a
    /// programmer error: it asserts in debug builds and returns `None`
    /// without touching the registry otherwise.
    pub fn emplace(&mut self, arena: &MapComponentArena, handle: MapHandle) -> Option<EntryMut<'_>> {
        let Some(module) = arena.get(handle) else {
            debug_assert!(false, "emplace: module {handle} is not live in the arena");
            return None;
        };

        if let Some(index) = self.index_of(handle) {
            return Some(EntryMut {
                registry: self,
                index,
            });
        }

        self.id_counter += 1;
        let entry = RegistryEntry {
            module: handle,
            cell: module.cell(),
            actor_type: module.actor_type(),
            replication_id: self.id_counter,
            replication_key: 1,
        };
        self.items.push(entry);
        self.mark_array_dirty();

        debug!(
            module = %handle,
            cell = %entry.cell,
            actor_type = %entry.actor_type,
            id = entry.replication_id,
            "module registered"
        );
        self.notify(RegistryEvent::Registered {
            module: handle,
            cell: entry.cell,
        });

        let index = self.items.len() - 1;
        Some(EntryMut {
            registry: self,
            index,
        })
    }

    /// Moves a registered module to `cell` and pushes the new cell into its
    /// module through `modules`, so entry and module never disagree.
    ///
    /// Returns `true` if the module is registered. Setting the cell it
    /// already has changes nothing.
    pub fn set_cell(&mut self, handle: MapHandle, cell: Cell, modules: &mut impl ModuleSink) -> bool {
        match self.index_of(handle) {
            Some(index) => {
                self.update_cell_at(index, cell, modules);
                true
            }
            None => false,
        }
    }

    /// Removes the entry for `handle`. Returns `true` if one existed.
    pub fn remove(&mut self, handle: MapHandle) -> bool {
        match self.index_of(handle) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    /// Removes the first entry at `cell`. Returns `true` if one existed.
    pub fn remove_cell(&mut self, cell: Cell) -> bool {
        if !cell.is_valid() {
            return false;
        }
        match self.items.iter().position(|entry| entry.cell == cell) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    /// Removes every entry. Subscribers see one `Removed` per entry.
    /// Replication ids keep counting up afterwards.
    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }

        let removed: Vec<RegistryEntry> = self.items.drain(..).collect();
        self.mark_array_dirty();
        info!(count = removed.len(), "registry cleared");

        for entry in removed {
            self.notify(RegistryEvent::Removed {
                module: entry.module,
                cell: entry.cell,
            });
        }
    }

    #[must_use]
    pub fn contains_module(&self, handle: MapHandle) -> bool {
        self.index_of(handle).is_some()
    }

    #[must_use]
    pub fn contains_cell(&self, cell: Cell) -> bool {
        self.find_by_cell(cell).is_some()
    }

    #[must_use]
    pub fn find(&self, handle: MapHandle) -> Option<&RegistryEntry> {
        self.items.iter().find(|entry| entry.module == handle)
    }

    /// First entry at `cell`. The invalid cell never matches.
    #[must_use]
    pub fn find_by_cell(&self, cell: Cell) -> Option<&RegistryEntry> {
        if !cell.is_valid() {
            return None;
        }
        self.items.iter().find(|entry| entry.cell == cell)
    }

    /// Module at position `index` in registry order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<MapHandle> {
        self.items.get(index).map(RegistryEntry::module)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.items
    }

    /// Array version. Bumped by every add, remove and cell change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.array_version
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether anything changed since the last call, and clears the
    /// marker.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn iter(&self) -> ModuleIter<'_> {
        ModuleIter::new(&self.items)
    }

    /// Cells occupied by at least one actor whose type is in `mask`.
    #[must_use]
    pub fn cells_with_actors(&self, mask: ActorTypeMask) -> Cells {
        self.items
            .iter()
            .filter(|entry| mask.contains(entry.actor_type))
            .map(|entry| entry.cell)
            .collect()
    }

    /// Modules whose actor type is in `mask`, in registry order.
    pub fn modules_with_actors(&self, mask: ActorTypeMask) -> impl Iterator<Item = MapHandle> + '_ {
        self.items
            .iter()
            .filter(move |entry| mask.contains(entry.actor_type))
            .map(RegistryEntry::module)
    }

    /// Cells of `grid` that no actor occupies.
    #[must_use]
    pub fn empty_cells(&self, grid: &Cells) -> Cells {
        let occupied = self.cells_with_actors(ActorTypeMask::ALL);
        grid.difference(&occupied).copied().collect()
    }

    /// What changed since `baseline` was last advanced. `None` if nothing
    /// did.
    ///
    /// Only valid entries replicate. An entry without a cell is left out
    /// until it gets one, and one that loses its cell after being sent is
    /// reported as removed.
    #[must_use]
    pub fn delta_since(&self, baseline: &Baseline) -> Option<RegistryDelta> {
        if baseline.version == self.array_version {
            return None;
        }

        let changed: Vec<ReplicatedItem> = self
            .replicated()
            .filter(|entry| baseline.keys.get(&entry.replication_id) != Some(&entry.replication_key))
            .map(ReplicatedItem::from)
            .collect();

        let mut removed: Vec<u32> = baseline
            .keys
            .keys()
            .copied()
            .filter(|id| !self.replicated().any(|entry| entry.replication_id == *id))
            .collect();
        removed.sort_unstable();

        let delta = RegistryDelta {
            base_version: baseline.version,
            version: self.array_version,
            changed,
            removed,
            full: false,
        };
        (!delta.is_empty()).then_some(delta)
    }

    /// Every entry, for an observer that has to start over.
    #[must_use]
    pub fn full_snapshot(&self) -> RegistryDelta {
        RegistryDelta {
            base_version: 0,
            version: self.array_version,
            changed: self.replicated().map(ReplicatedItem::from).collect(),
            removed: Vec::new(),
            full: true,
        }
    }

    /// Registers a callback invoked synchronously on every change.
    pub fn subscribe(&mut self, callback: impl FnMut(&RegistryEvent) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    fn replicated(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.items.iter().filter(|entry| entry.is_valid())
    }

    fn index_of(&self, handle: MapHandle) -> Option<usize> {
        self.items.iter().position(|entry| entry.module == handle)
    }

    fn update_cell_at(&mut self, index: usize, cell: Cell, modules: &mut impl ModuleSink) -> bool {
        let entry = &mut self.items[index];
        if entry.cell == cell {
            return false;
        }

        let from = entry.cell;
        entry.cell = cell;
        entry.replication_key = entry.replication_key.wrapping_add(1);
        let (module, actor_type) = (entry.module, entry.actor_type);
        self.mark_array_dirty();
        modules.push_cell(module, actor_type, cell);

        debug!(module = %module, %from, to = %cell, "registered cell changed");
        self.notify(RegistryEvent::CellChanged {
            module,
            from,
            to: cell,
        });
        true
    }

    fn remove_at(&mut self, index: usize) {
        let entry = self.items.swap_remove(index);
        self.mark_array_dirty();

        debug!(module = %entry.module, cell = %entry.cell, id = entry.replication_id, "module removed");
        self.notify(RegistryEvent::Removed {
            module: entry.module,
            cell: entry.cell,
        });
    }

    fn mark_array_dirty(&mut self) {
        self.array_version += 1;
        self.dirty = true;
    }

    fn notify(&mut self, event: RegistryEvent) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&event);
        }
    }
}

impl fmt::Debug for MapRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapRegistry")
            .field("items", &self.items)
            .field("id_counter", &self.id_counter)
            .field("array_version", &self.array_version)
            .field("dirty", &self.dirty)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<'a> IntoIterator for &'a MapRegistry {
    type Item = MapHandle;
    type IntoIter = ModuleIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Mutable access to one registry entry.
///
/// Changes go through the registry so the entry's key and the array version
/// are bumped and subscribers hear about it.
pub struct EntryMut<'a> {
    registry: &'a mut MapRegistry,
    index: usize,
}

impl EntryMut<'_> {
    /// Moves the entry to `cell` and pushes it into the module. Returns
    /// `true` if the cell changed.
    pub fn set_cell(&mut self, cell: Cell, modules: &mut impl ModuleSink) -> bool {
        self.registry.update_cell_at(self.index, cell, modules)
    }
}

impl Deref for EntryMut<'_> {
    type Target = RegistryEntry;

    fn deref(&self) -> &Self::Target {
        &self.registry.items[self.index]
    }
}

impl fmt::Debug for EntryMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntryMut").field(&**self).finish()
    }
}
