//! Observer runner, the harness that connects a session to a level server.

use anyhow::Result;
use level_net::NatsConnection;
use level_net::messages::{
    BoardState, DeltaAck, LevelEnded, ObserverJoin, ObserverLeave, RegistryDeltaMessage,
    ResyncRequest,
};
use level_net::subjects;
use level_registry::ReplicationEvent;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ObserverConfig;
use crate::session::{DeltaOutcome, ObserverSession};

/// Turns a callback into a NATS-connected observer process.
#[derive(Debug)]
pub struct ObserverRunner {
    config: ObserverConfig,
    observer_id: Uuid,
}

impl ObserverRunner {
    #[must_use]
    pub fn new(config: ObserverConfig) -> Self {
        Self {
            config,
            observer_id: Uuid::new_v4(),
        }
    }

    #[must_use]
    pub fn observer_id(&self) -> Uuid {
        self.observer_id
    }

    /// Subject the server publishes this observer's deltas on.
    #[must_use]
    pub fn delta_subject(&self) -> String {
        subjects::registry_delta(&self.observer_id.to_string())
    }

    /// Run the observer lifecycle.
    ///
    /// 1. Connect to NATS and subscribe to the delta, board and level-end
    ///    subjects.
    /// 2. Publish an `ObserverJoin`.
    /// 3. Apply every delta, then call `on_events` with the session and the
    ///    hooks the delta fired. Ack applied versions, request a resync on a
    ///    gap.
    /// 4. On level end or Ctrl-C, publish an `ObserverLeave`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, a subscription or a publish fails.
    pub async fn run<F>(self, mut on_events: F) -> Result<()>
    where
        F: FnMut(&ObserverSession, &[ReplicationEvent]) + Send,
    {
        let url = self.config.nats_url.as_str();
        info!(observer_id = %self.observer_id, url, "observer starting");

        let conn = NatsConnection::connect_to(url).await?;

        // Subscribe before joining so the first snapshot is not missed.
        let mut deltas = conn.delta_inbox(self.observer_id).await?;
        let mut boards = conn.inbox::<BoardState>().await?;
        let mut level_ends = conn.inbox::<LevelEnded>().await?;

        conn.send(&ObserverJoin {
            observer_id: self.observer_id,
        })
        .await?;
        info!(observer_id = %self.observer_id, subject = %self.delta_subject(), "joined level");

        let mut session = ObserverSession::new();
        loop {
            tokio::select! {
                Some(delta) = deltas.next() => match delta {
                    Ok(message) => self.on_delta(&conn, &mut session, &message, &mut on_events).await?,
                    Err(e) => warn!(%e, "malformed registry delta"),
                },
                Some(board) = boards.next() => match board {
                    Ok(board) => session.handle_board(&board),
                    Err(e) => warn!(%e, "malformed board state"),
                },
                Some(ended) = level_ends.next() => {
                    match ended {
                        Ok(ended) => debug!(tick_id = ended.tick_id, "level end received"),
                        Err(e) => warn!(%e, "malformed level end"),
                    }
                    session.handle_level_end();
                    if self.config.exit_on_level_end {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!(observer_id = %self.observer_id, "shutdown requested");
                    break;
                }
                else => break,
            }
        }

        conn.send(&ObserverLeave {
            observer_id: self.observer_id,
        })
        .await?;
        conn.flush().await?;
        info!(observer_id = %self.observer_id, "observer stopped");
        Ok(())
    }

    async fn on_delta<F>(
        &self,
        conn: &NatsConnection,
        session: &mut ObserverSession,
        message: &RegistryDeltaMessage,
        on_events: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&ObserverSession, &[ReplicationEvent]),
    {
        match session.handle_delta(message) {
            DeltaOutcome::Applied { version, events } => {
                debug!(tick_id = message.tick_id, version, events = events.len(), "delta applied");
                on_events(session, &events);
                conn.send(&DeltaAck {
                    observer_id: self.observer_id,
                    version,
                })
                .await?;
            }
            DeltaOutcome::ResyncNeeded { version } => {
                warn!(observer_id = %self.observer_id, version, "requesting resync");
                conn.send(&ResyncRequest {
                    observer_id: self.observer_id,
                    version,
                })
                .await?;
            }
            DeltaOutcome::AwaitingResync => {}
        }
        Ok(())
    }
}
