//! Observer-side level state.
//!
//! An [`ObserverSession`] holds everything one observer mirrors from the
//! server: the replicated registry, proxy modules for every replicated actor
//! and the board grid. It does no I/O, the runner feeds it decoded messages.

use level_component::{MapHandle, ProxyModules};
use level_math::{Cell, Cells, Placement, make_grid_from_placement};
use level_net::messages::{BoardState, RegistryDeltaMessage};
use level_registry::{RegistryReplica, ReplicaError, ReplicationEvent};
use tracing::{debug, info};

/// Result of feeding one delta message to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum DeltaOutcome {
    /// The delta was applied. Ack `version`.
    Applied {
        version: u64,
        events: Vec<ReplicationEvent>,
    },
    /// The delta did not follow on from the replica. Ask for a resync from
    /// `version`.
    ResyncNeeded { version: u64 },
    /// A resync was already requested; incremental deltas are dropped until
    /// the full snapshot arrives.
    AwaitingResync,
}

#[derive(Debug, Default)]
pub struct ObserverSession {
    replica: RegistryReplica,
    proxies: ProxyModules,
    board: Option<Placement>,
    grid: Cells,
    awaiting_resync: bool,
}

impl ObserverSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn replica(&self) -> &RegistryReplica {
        &self.replica
    }

    #[must_use]
    pub fn proxies(&self) -> &ProxyModules {
        &self.proxies
    }

    /// Last board placement received, if any.
    #[must_use]
    pub fn board(&self) -> Option<&Placement> {
        self.board.as_ref()
    }

    #[must_use]
    pub fn grid(&self) -> &Cells {
        &self.grid
    }

    #[must_use]
    pub fn is_awaiting_resync(&self) -> bool {
        self.awaiting_resync
    }

    /// Cell of a replicated actor as its proxy module last saw it.
    #[must_use]
    pub fn cell_of(&self, module: MapHandle) -> Option<Cell> {
        self.proxies.cell(module)
    }

    /// Applies a registry delta to the replica and its proxies.
    ///
    /// Proxies of removed actors are detached once their last cell was
    /// pushed.
    pub fn handle_delta(&mut self, message: &RegistryDeltaMessage) -> DeltaOutcome {
        let delta = &message.delta;
        if self.awaiting_resync && !delta.full {
            debug!(
                tick_id = message.tick_id,
                version = delta.version,
                "dropping delta while awaiting resync"
            );
            return DeltaOutcome::AwaitingResync;
        }

        match self.replica.apply(delta, &mut self.proxies) {
            Ok(events) => {
                for event in &events {
                    if let ReplicationEvent::PreRemove { module, .. } = event {
                        self.proxies.detach(*module);
                    }
                }
                if delta.full {
                    info!(
                        tick_id = message.tick_id,
                        version = delta.version,
                        entries = self.replica.len(),
                        "full snapshot applied"
                    );
                }
                self.awaiting_resync = false;
                DeltaOutcome::Applied {
                    version: self.replica.version(),
                    events,
                }
            }
            Err(ReplicaError::VersionGap { expected, .. }) => {
                self.awaiting_resync = true;
                DeltaOutcome::ResyncNeeded { version: expected }
            }
        }
    }

    /// Rebuilds the grid from a new board placement.
    pub fn handle_board(&mut self, board: &BoardState) {
        self.grid = make_grid_from_placement(&board.placement);
        self.board = Some(board.placement);
        info!(
            tick_id = board.tick_id,
            columns = board.placement.columns(),
            rows = board.placement.rows(),
            cells = self.grid.len(),
            "board updated"
        );
    }

    /// Drops the replica, the proxies and the board.
    pub fn handle_level_end(&mut self) {
        *self = Self::default();
        info!("level ended, replica cleared");
    }
}
