//! Standalone observer: mirrors a level and logs every placement change.

use anyhow::Result;
use clap::Parser;
use level_observer::{ObserverArgs, ObserverRunner};
use level_registry::ReplicationEvent;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("level_observer=info".parse()?),
        )
        .init();

    let args = ObserverArgs::parse();

    ObserverRunner::new(args.config())
        .run(|session, events| {
            for event in events {
                match event {
                    ReplicationEvent::PreRemove { module, cell } => {
                        info!(%module, %cell, "actor removed");
                    }
                    ReplicationEvent::PostAdd { module, cell } => {
                        info!(%module, %cell, "actor added");
                    }
                    ReplicationEvent::PostChange { module, cell } => {
                        info!(%module, %cell, "actor moved");
                    }
                }
            }
            info!(actors = session.replica().len(), "replica updated");
        })
        .await
}
