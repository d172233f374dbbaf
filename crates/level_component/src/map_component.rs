//! The per-actor placement module.
//!
//! Every level actor that occupies the board owns one [`MapComponent`]. It
//! caches the cell the actor stands on. The registry mirrors that cell, and
//! anything that moves an actor goes through a [`ModuleSink`] so the cache
//! and the registry never disagree.

use level_math::{Cell, Placement};
use serde::{Deserialize, Serialize};

use crate::actor::ActorType;
use crate::handle::MapHandle;

/// Cached cell of a level actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapComponent {
    cell: Cell,
    actor_type: ActorType,
}

impl MapComponent {
    /// Creates the module for an actor placed at `owner`. The initial cell is
    /// the owner's position snapped to the cell pitch.
    #[must_use]
    pub fn new(owner: &Placement, actor_type: ActorType) -> Self {
        Self {
            cell: Cell::new(owner.position).snap(),
            actor_type,
        }
    }

    /// Creates the module with an explicit cell, stored as given.
    #[must_use]
    pub fn with_cell(cell: Cell, actor_type: ActorType) -> Self {
        Self { cell, actor_type }
    }

    #[must_use]
    pub fn cell(&self) -> Cell {
        self.cell
    }

    /// Overwrites the cached cell.
    pub fn set_cell(&mut self, cell: Cell) {
        self.cell = cell;
    }

    #[must_use]
    pub fn actor_type(&self) -> ActorType {
        self.actor_type
    }
}

/// Anything that can receive a cell for a module.
///
/// On the authoritative side this is the [`MapComponentArena`](crate::MapComponentArena);
/// on an observer it is [`ProxyModules`](crate::ProxyModules). Replication
/// hooks only ever talk to this trait.
pub trait ModuleSink {
    /// Stores `cell` as the module's current cell.
    fn push_cell(&mut self, module: MapHandle, actor_type: ActorType, cell: Cell);
}
