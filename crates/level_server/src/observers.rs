//! Observer bookkeeping.
//!
//! Join, leave, ack and resync messages arrive on a listener task and land in
//! the [`ObserverTable`]. The tick loop reads the table once per tick to work
//! out which delta each observer needs.

// Part of this API is only driven by gameplay code and tests, not by main().
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use level_net::NatsConnection;
use level_net::messages::{DeltaAck, ObserverJoin, ObserverLeave, ResyncRequest};
use level_registry::{Baseline, MapRegistry, RegistryDelta};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Observers more than this many versions behind their last ack are logged.
pub const ACK_LAG_WARNING: u64 = 256;

/// What the server knows about one observer.
#[derive(Debug, Clone, Default)]
pub struct ObserverState {
    /// Everything sent to the observer so far.
    pub baseline: Baseline,
    /// Highest version the observer confirmed.
    pub acked_version: u64,
    /// The next send must be a full snapshot.
    pub needs_full: bool,
}

/// A delta ready to be published to one observer.
#[derive(Debug, Clone)]
pub struct Outgoing {
    pub observer_id: Uuid,
    pub delta: RegistryDelta,
}

/// Per-observer replication state, shared between the listener task and the
/// tick loop.
#[derive(Debug, Default)]
pub struct ObserverTable {
    observers: DashMap<Uuid, ObserverState>,
}

impl ObserverTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer, or resets one that joins again. Its first delta is a
    /// full snapshot.
    pub fn join(&self, observer_id: Uuid) {
        self.observers.insert(
            observer_id,
            ObserverState {
                needs_full: true,
                ..ObserverState::default()
            },
        );
        info!(%observer_id, observers = self.observers.len(), "observer joined");
    }

    /// Returns `true` if the observer was known.
    pub fn leave(&self, observer_id: Uuid) -> bool {
        let removed = self.observers.remove(&observer_id).is_some();
        if removed {
            info!(%observer_id, observers = self.observers.len(), "observer left");
        }
        removed
    }

    /// Records an ack. Acks for unknown observers and stale acks are ignored.
    pub fn ack(&self, observer_id: Uuid, version: u64) {
        match self.observers.get_mut(&observer_id) {
            Some(mut state) => {
                state.acked_version = state.acked_version.max(version);
                debug!(%observer_id, version, "delta acked");
            }
            None => debug!(%observer_id, version, "ack from unknown observer"),
        }
    }

    /// Schedules a full snapshot for an observer that lost track.
    pub fn request_resync(&self, observer_id: Uuid, version: u64) {
        match self.observers.get_mut(&observer_id) {
            Some(mut state) => {
                state.needs_full = true;
                warn!(%observer_id, version, "observer requested resync");
            }
            None => debug!(%observer_id, "resync from unknown observer"),
        }
    }

    #[must_use]
    pub fn contains(&self, observer_id: Uuid) -> bool {
        self.observers.contains_key(&observer_id)
    }

    #[must_use]
    pub fn state(&self, observer_id: Uuid) -> Option<ObserverState> {
        self.observers.get(&observer_id).map(|state| state.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Computes the delta each observer needs and records it as sent.
    ///
    /// Observers flagged for a full snapshot get one; the rest get what
    /// changed since their baseline, or nothing if nothing did.
    pub fn prepare_deltas(&self, registry: &MapRegistry) -> Vec<Outgoing> {
        let mut outgoing = Vec::new();
        for mut item in self.observers.iter_mut() {
            let observer_id = *item.key();
            let state = item.value_mut();

            let delta = if state.needs_full {
                state.needs_full = false;
                Some(registry.full_snapshot())
            } else {
                registry.delta_since(&state.baseline)
            };

            if let Some(delta) = delta {
                state.baseline.advance(&delta);
                outgoing.push(Outgoing { observer_id, delta });
            }

            let lag = registry.version().saturating_sub(state.acked_version);
            if lag > ACK_LAG_WARNING {
                warn!(%observer_id, lag, "observer is falling behind");
            }
        }
        outgoing
    }
}

/// Feeds observer messages into `table` until the connection closes.
///
/// # Errors
///
/// Returns an error if a subscription cannot be created.
pub async fn listen(conn: NatsConnection, table: Arc<ObserverTable>) -> Result<()> {
    let mut joins = conn.inbox::<ObserverJoin>().await?;
    let mut leaves = conn.inbox::<ObserverLeave>().await?;
    let mut acks = conn.inbox::<DeltaAck>().await?;
    let mut resyncs = conn.inbox::<ResyncRequest>().await?;
    info!("listening for observers");

    loop {
        tokio::select! {
            Some(join) = joins.next() => match join {
                Ok(join) => table.join(join.observer_id),
                Err(e) => warn!(%e, "malformed observer join"),
            },
            Some(leave) = leaves.next() => match leave {
                Ok(leave) => {
                    table.leave(leave.observer_id);
                }
                Err(e) => warn!(%e, "malformed observer leave"),
            },
            Some(ack) = acks.next() => match ack {
                Ok(ack) => table.ack(ack.observer_id, ack.version),
                Err(e) => warn!(%e, "malformed delta ack"),
            },
            Some(request) = resyncs.next() => match request {
                Ok(request) => table.request_resync(request.observer_id, request.version),
                Err(e) => warn!(%e, "malformed resync request"),
            },
            else => break,
        }
    }

    info!("observer listener stopped");
    Ok(())
}
