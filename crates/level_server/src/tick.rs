//! Server tick loop.
//!
//! Each tick:
//!
//! 1. Run gameplay against the [`LevelInstance`].
//! 2. Work out the registry delta every observer needs.
//! 3. Publish the board (when it changed or someone needs a full snapshot)
//!    and then the deltas.
//! 4. Advance the tick counter.

// Part of this API is only driven by gameplay code and tests, not by main().
#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use level_math::Placement;
use level_net::NatsConnection;
use level_net::messages::{BoardState, LevelEnded, RegistryDeltaMessage};
use tracing::{debug, info, warn};

use crate::level::LevelInstance;
use crate::observers::{ObserverTable, Outgoing};

/// Configuration for the server tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30.0,
            max_ticks: 0,
        }
    }
}

/// What one tick produced for the transport.
#[derive(Debug, Default)]
pub struct TickOutput {
    pub tick_id: u64,
    /// Set when the board changed this tick or an observer is about to get a
    /// full snapshot.
    pub board: Option<Placement>,
    pub deltas: Vec<Outgoing>,
}

/// The server's tick loop state.
#[derive(Debug)]
pub struct TickLoop {
    tick_id: u64,
    config: TickConfig,
    level: LevelInstance,
    observers: Arc<ObserverTable>,
}

impl TickLoop {
    #[must_use]
    pub fn new(config: TickConfig, level: LevelInstance, observers: Arc<ObserverTable>) -> Self {
        Self {
            tick_id: 0,
            config,
            level,
            observers,
        }
    }

    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn observers(&self) -> &Arc<ObserverTable> {
        &self.observers
    }

    /// Run one tick: gameplay, then replication bookkeeping.
    pub fn tick<F>(&mut self, dt: f64, gameplay: &mut F) -> TickOutput
    where
        F: FnMut(&mut LevelInstance, u64),
    {
        self.tick_id += 1;
        debug!(tick_id = self.tick_id, dt, "tick start");

        let board_before = *self.level.board();
        gameplay(&mut self.level, self.tick_id);
        let board_changed = *self.level.board() != board_before;

        if self.level.registry_mut().take_dirty() {
            debug!(
                tick_id = self.tick_id,
                version = self.level.registry().version(),
                entries = self.level.registry().len(),
                "registry changed"
            );
        }

        let deltas = self.observers.prepare_deltas(self.level.registry());
        let any_full = deltas.iter().any(|out| out.delta.full);

        TickOutput {
            tick_id: self.tick_id,
            board: (board_changed || any_full).then(|| *self.level.board()),
            deltas,
        }
    }

    /// Run the loop locally for the configured number of ticks, or
    /// indefinitely, discarding the output. Useful for testing gameplay.
    pub fn run<F>(&mut self, mut gameplay: F)
    where
        F: FnMut(&mut LevelInstance, u64),
    {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();
            self.tick(tick_duration.as_secs_f64(), &mut gameplay);

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                self.warn_overrun(elapsed, tick_duration);
            }
        }
    }

    /// Run the loop against NATS until `max_ticks` or Ctrl-C, then end the
    /// level and tell observers.
    ///
    /// # Errors
    ///
    /// Returns an error if publishing fails.
    pub async fn run_async<F>(&mut self, conn: &NatsConnection, mut gameplay: F) -> Result<()>
    where
        F: FnMut(&mut LevelInstance, u64),
    {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let mut interval = tokio::time::interval(tick_duration);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!(tick_id = self.tick_id, "shutdown requested");
                    break;
                }
            }

            let start = Instant::now();
            let output = self.tick(tick_duration.as_secs_f64(), &mut gameplay);
            publish(conn, &output).await?;

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed > tick_duration {
                self.warn_overrun(elapsed, tick_duration);
            }
        }

        self.level.end();
        conn.send(&LevelEnded {
            tick_id: self.tick_id,
        })
        .await?;
        conn.flush().await?;
        Ok(())
    }

    fn warn_overrun(&self, elapsed: Duration, budget: Duration) {
        warn!(
            tick_id = self.tick_id,
            elapsed_ms = elapsed.as_millis() as u64,
            budget_ms = budget.as_millis() as u64,
            "tick exceeded time budget"
        );
    }
}

/// Publish one tick's board state and deltas.
async fn publish(conn: &NatsConnection, output: &TickOutput) -> Result<()> {
    if let Some(placement) = output.board {
        conn.send(&BoardState {
            tick_id: output.tick_id,
            placement,
        })
        .await?;
    }

    for out in &output.deltas {
        let message = RegistryDeltaMessage {
            tick_id: output.tick_id,
            delta: out.delta.clone(),
        };
        conn.send_delta(out.observer_id, &message).await?;
        debug!(
            observer_id = %out.observer_id,
            version = out.delta.version,
            changed = out.delta.changed.len(),
            removed = out.delta.removed.len(),
            full = out.delta.full,
            "delta published"
        );
    }
    Ok(())
}
