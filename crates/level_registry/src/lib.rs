//! # level_registry
//!
//! The replicated registry of level actor placements. The authoritative
//! [`MapRegistry`] records which module occupies which cell; observers keep a
//! read-only [`RegistryReplica`] in sync by applying [`RegistryDelta`]s.
//!
//! Every entry carries a replication id and a replication key. The key is
//! bumped on each change, so a delta computed against a per-observer
//! [`Baseline`] reports each add, remove and cell change individually, even
//! when the number of entries stays the same.

pub mod delta;
pub mod entry;
pub mod error;
pub mod events;
pub mod iter;
pub mod registry;
pub mod replica;

pub use delta::{Baseline, RegistryDelta, ReplicatedItem};
pub use entry::RegistryEntry;
pub use error::ReplicaError;
pub use events::{RegistryEvent, ReplicationEvent, SubscriptionId};
pub use iter::ModuleIter;
pub use registry::{EntryMut, MapRegistry};
pub use replica::RegistryReplica;
