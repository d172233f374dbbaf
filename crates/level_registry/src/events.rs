//! Notifications emitted by the registry and the replica.

use level_component::MapHandle;
use level_math::Cell;
use serde::{Deserialize, Serialize};

/// A change to the authoritative registry, delivered synchronously to every
/// subscriber of [`MapRegistry`](crate::MapRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    Registered { module: MapHandle, cell: Cell },
    Removed { module: MapHandle, cell: Cell },
    CellChanged { module: MapHandle, from: Cell, to: Cell },
}

/// Hook fired by [`RegistryReplica::apply`](crate::RegistryReplica::apply)
/// for each replicated item. The cell is the one pushed into the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicationEvent {
    /// The item is about to be dropped. Carries its last cached cell.
    PreRemove { module: MapHandle, cell: Cell },
    /// A new item arrived.
    PostAdd { module: MapHandle, cell: Cell },
    /// A known item changed.
    PostChange { module: MapHandle, cell: Cell },
}

impl ReplicationEvent {
    #[must_use]
    pub fn module(&self) -> MapHandle {
        match *self {
            ReplicationEvent::PreRemove { module, .. }
            | ReplicationEvent::PostAdd { module, .. }
            | ReplicationEvent::PostChange { module, .. } => module,
        }
    }

    #[must_use]
    pub fn cell(&self) -> Cell {
        match *self {
            ReplicationEvent::PreRemove { cell, .. }
            | ReplicationEvent::PostAdd { cell, .. }
            | ReplicationEvent::PostChange { cell, .. } => cell,
        }
    }
}

/// Returned by [`MapRegistry::subscribe`](crate::MapRegistry::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u32);
