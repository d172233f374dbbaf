//! Command-line configuration for the level server.

use clap::Parser;
use level_math::{Placement, Vec3};
use level_net::connection::{DEFAULT_NATS_URL, NATS_URL_ENV};

use crate::tick::TickConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "level_server", about = "Authoritative level host replicating actor placements over NATS")]
pub struct ServerArgs {
    /// NATS server URL
    #[arg(short, long, env = NATS_URL_ENV, default_value = DEFAULT_NATS_URL)]
    pub nats_url: String,

    /// Target ticks per second
    #[arg(long, default_value_t = 30.0)]
    pub tick_rate: f64,

    /// Stop after this many ticks (0 runs until Ctrl-C)
    #[arg(long, default_value_t = 0)]
    pub max_ticks: u64,

    /// Board columns
    #[arg(long, default_value_t = 13)]
    pub columns: u32,

    /// Board rows
    #[arg(long, default_value_t = 11)]
    pub rows: u32,

    /// Board yaw in degrees
    #[arg(long, default_value_t = 0.0)]
    pub yaw: f32,

    /// Place walls and one player per corner at startup
    #[arg(long)]
    pub seed_actors: bool,
}

impl ServerArgs {
    #[must_use]
    pub fn tick_config(&self) -> TickConfig {
        TickConfig {
            tick_rate: self.tick_rate,
            max_ticks: self.max_ticks,
        }
    }

    /// Board centred on the world origin.
    #[must_use]
    pub fn board(&self) -> Placement {
        Placement::board(Vec3::ZERO, self.yaw, self.columns, self.rows)
    }
}
