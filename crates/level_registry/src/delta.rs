//! Delta replication between the registry and its observers.

use std::collections::HashMap;

use level_component::{ActorType, MapHandle};
use level_math::Cell;
use serde::{Deserialize, Serialize};

use crate::entry::RegistryEntry;

/// The replicated form of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicatedItem {
    pub id: u32,
    pub key: u32,
    pub module: MapHandle,
    pub actor_type: ActorType,
    pub cell: Cell,
}

impl From<&RegistryEntry> for ReplicatedItem {
    fn from(entry: &RegistryEntry) -> Self {
        Self {
            id: entry.replication_id,
            key: entry.replication_key,
            module: entry.module,
            actor_type: entry.actor_type,
            cell: entry.cell,
        }
    }
}

impl From<ReplicatedItem> for RegistryEntry {
    fn from(item: ReplicatedItem) -> Self {
        Self {
            module: item.module,
            cell: item.cell,
            actor_type: item.actor_type,
            replication_id: item.id,
            replication_key: item.key,
        }
    }
}

/// Everything an observer needs to move from `base_version` to `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDelta {
    /// Registry version the delta was computed against.
    pub base_version: u64,
    /// Registry version after applying the delta.
    pub version: u64,
    /// New items and items whose key changed, in registry order.
    pub changed: Vec<ReplicatedItem>,
    /// Ids of removed items, ascending.
    pub removed: Vec<u32>,
    /// A full snapshot: `changed` is the complete item list and any local
    /// item missing from it must be dropped.
    pub full: bool,
}

impl RegistryDelta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// What one observer has been sent so far: the version and the key of every
/// item at that version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    pub version: u64,
    pub keys: HashMap<u32, u32>,
}

impl Baseline {
    /// An observer that has received nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `delta` as sent.
    pub fn advance(&mut self, delta: &RegistryDelta) {
        if delta.full {
            self.keys.clear();
        }
        for id in &delta.removed {
            self.keys.remove(id);
        }
        for item in &delta.changed {
            self.keys.insert(item.id, item.key);
        }
        self.version = delta.version;
    }

    /// Forgets everything, so the next delta carries every item.
    pub fn reset(&mut self) {
        self.version = 0;
        self.keys.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
