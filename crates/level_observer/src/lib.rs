//! # level_observer
//!
//! Observer runtime for the level registry.
//!
//! An observer joins a level server over NATS and keeps a read-only mirror of
//! its placement registry. Each process:
//!
//! 1. Connects to NATS.
//! 2. Subscribes to its own delta subject, the board and level-end subjects.
//! 3. Announces itself; the server answers with a full snapshot.
//! 4. Applies every delta to a [`RegistryReplica`](level_registry::RegistryReplica),
//!    pushes cells into proxy modules and acks the version. On a version gap
//!    it asks for a resync instead.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use level_observer::{ObserverConfig, ObserverRunner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ObserverConfig::new().with_nats_url("nats://localhost:4222");
//!     let runner = ObserverRunner::new(config);
//!     // runner.run(|session, events| { /* react to placements */ }).await.unwrap();
//! }
//! ```

pub mod config;
pub mod runner;
pub mod session;

pub use config::{ObserverArgs, ObserverConfig};
pub use runner::ObserverRunner;
pub use session::{DeltaOutcome, ObserverSession};
