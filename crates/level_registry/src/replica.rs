//! Observer-side copy of the registry.

use level_component::{MapHandle, ModuleSink};
use level_math::Cell;
use tracing::{debug, warn};

use crate::delta::RegistryDelta;
use crate::entry::RegistryEntry;
use crate::error::ReplicaError;
use crate::events::ReplicationEvent;
use crate::iter::ModuleIter;

/// A read-only mirror of a [`MapRegistry`](crate::MapRegistry).
///
/// The only way to change it is [`RegistryReplica::apply`]. Each applied
/// item fires a hook that pushes the item's cell into its module through a
/// [`ModuleSink`], so module caches never lag behind the replica.
#[derive(Debug, Default)]
pub struct RegistryReplica {
    items: Vec<RegistryEntry>,
    version: u64,
}

impl RegistryReplica {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a delta and returns the hooks it fired, in order: every
    /// pre-remove, then every post-add, then every post-change.
    ///
    /// A delta whose base version is not this replica's version is rejected
    /// unchanged, unless it is a full snapshot.
    pub fn apply(
        &mut self,
        delta: &RegistryDelta,
        sink: &mut impl ModuleSink,
    ) -> Result<Vec<ReplicationEvent>, ReplicaError> {
        if !delta.full && delta.base_version != self.version {
            warn!(
                expected = self.version,
                received = delta.base_version,
                "replication delta skipped a version"
            );
            return Err(ReplicaError::VersionGap {
                expected: self.version,
                received: delta.base_version,
            });
        }

        let mut events = Vec::with_capacity(delta.changed.len() + delta.removed.len());

        let mut removed = delta.removed.clone();
        if delta.full {
            removed.extend(
                self.items
                    .iter()
                    .map(|item| item.replication_id)
                    .filter(|id| !delta.changed.iter().any(|changed| changed.id == *id)),
            );
        }
        for id in removed {
            let Some(index) = self.index_of_id(id) else {
                continue;
            };
            // Pre-remove hands the module its last cached cell. The module
            // itself may already be gone on this side.
            let item = self.items.swap_remove(index);
            sink.push_cell(item.module, item.actor_type, item.cell);
            events.push(ReplicationEvent::PreRemove {
                module: item.module,
                cell: item.cell,
            });
        }

        let added: Vec<RegistryEntry> = delta
            .changed
            .iter()
            .filter(|changed| self.index_of_id(changed.id).is_none())
            .map(|changed| RegistryEntry::from(*changed))
            .collect();
        for item in added {
            self.items.push(item);
            sink.push_cell(item.module, item.actor_type, item.cell);
            events.push(ReplicationEvent::PostAdd {
                module: item.module,
                cell: item.cell,
            });
        }

        for changed in &delta.changed {
            let Some(index) = self.index_of_id(changed.id) else {
                continue;
            };
            let item = &mut self.items[index];
            if item.replication_key == changed.key {
                continue;
            }
            *item = RegistryEntry::from(*changed);
            sink.push_cell(item.module, item.actor_type, item.cell);
            events.push(ReplicationEvent::PostChange {
                module: item.module,
                cell: item.cell,
            });
        }

        self.version = delta.version;
        debug!(
            version = self.version,
            events = events.len(),
            full = delta.full,
            "replication delta applied"
        );
        Ok(events)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn contains_module(&self, handle: MapHandle) -> bool {
        self.find(handle).is_some()
    }

    #[must_use]
    pub fn contains_cell(&self, cell: Cell) -> bool {
        self.find_by_cell(cell).is_some()
    }

    #[must_use]
    pub fn find(&self, handle: MapHandle) -> Option<&RegistryEntry> {
        self.items.iter().find(|item| item.module == handle)
    }

    #[must_use]
    pub fn find_by_cell(&self, cell: Cell) -> Option<&RegistryEntry> {
        if !cell.is_valid() {
            return None;
        }
        self.items.iter().find(|item| item.cell == cell)
    }

    #[must_use]
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> ModuleIter<'_> {
        ModuleIter::new(&self.items)
    }

    fn index_of_id(&self, id: u32) -> Option<usize> {
        self.items.iter().position(|item| item.replication_id == id)
    }
}

impl<'a> IntoIterator for &'a RegistryReplica {
    type Item = MapHandle;
    type IntoIter = ModuleIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
