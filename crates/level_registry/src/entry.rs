//! One row of the registry.

use level_component::{ActorType, MapHandle};
use level_math::Cell;
use serde::{Deserialize, Serialize};

/// A module registered at a cell.
///
/// `replication_id` identifies the entry for its whole life and is never
/// reused by the registry that issued it. `replication_key` changes whenever
/// the entry does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub(crate) module: MapHandle,
    pub(crate) cell: Cell,
    pub(crate) actor_type: ActorType,
    pub(crate) replication_id: u32,
    pub(crate) replication_key: u32,
}

impl RegistryEntry {
    #[must_use]
    pub fn module(&self) -> MapHandle {
        self.module
    }

    #[must_use]
    pub fn cell(&self) -> Cell {
        self.cell
    }

    #[must_use]
    pub fn actor_type(&self) -> ActorType {
        self.actor_type
    }

    #[must_use]
    pub fn replication_id(&self) -> u32 {
        self.replication_id
    }

    #[must_use]
    pub fn replication_key(&self) -> u32 {
        self.replication_key
    }

    /// An entry is only worth replicating once both its module and its cell
    /// are set.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.module.is_valid() && self.cell.is_valid()
    }
}
