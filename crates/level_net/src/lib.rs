//! # level_net
//!
//! NATS transport for level registry replication.
//!
//! This crate provides:
//!
//! - [`subjects`]: NATS subject hierarchy constants and builders.
//! - [`messages`]: Message types exchanged between the level server and observers,
//!   each bound to its subject through [`LevelMessage`].
//! - [`codec`]: MessagePack payloads and the routing headers of registry deltas.
//! - [`connection`]: typed send and receive over a NATS client.
//! - [`error`]: Transport error types.

pub mod codec;
pub mod connection;
pub mod error;
pub mod messages;
pub mod subjects;

pub use codec::{decode, decode_delta, delta_headers, encode};
pub use connection::{DeltaInbox, Inbox, NatsConnection};
pub use error::NetError;
pub use messages::LevelMessage;
