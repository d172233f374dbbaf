//! # level_server: authoritative level host
//!
//! Owns the level board, the placement modules of every level actor and the
//! registry that records which actor stands on which cell. Observers receive
//! that registry as per-observer deltas over NATS.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments (`NATS_URL` may stand in for `--nats-url`).
//! 2. Build the level and optionally seed the default layout.
//! 3. Connect to NATS and start listening for observers.
//! 4. Enter the fixed-timestep tick loop.

mod config;
mod gameplay;
mod level;
mod observers;
mod tick;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::ServerArgs;
use level::LevelInstance;
use level_net::NatsConnection;
use observers::ObserverTable;
use tick::TickLoop;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("level_server=info".parse()?))
        .init();

    let args = ServerArgs::parse();
    info!("level server starting");

    let mut level = LevelInstance::new(args.board());
    if args.seed_actors {
        level.seed_default_actors();
    }

    let conn = NatsConnection::connect_to(&args.nats_url).await?;
    let observers = Arc::new(ObserverTable::new());

    let listener = tokio::spawn(observers::listen(conn.clone(), Arc::clone(&observers)));

    let mut tick_loop = TickLoop::new(args.tick_config(), level, observers);
    tick_loop.run_async(&conn, gameplay::wander_players).await?;

    listener.abort();
    match listener.await {
        Ok(Err(e)) => error!(%e, "observer listener failed"),
        Ok(Ok(())) | Err(_) => {}
    }

    info!("level server shut down");
    Ok(())
}
