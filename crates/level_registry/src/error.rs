//! Errors raised while applying replicated state.

/// Errors from [`RegistryReplica::apply`](crate::RegistryReplica::apply).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReplicaError {
    /// The delta was computed against a version this replica never reached.
    /// The replica is unchanged; the observer should request a full resync.
    #[error("delta base version {received} does not match replica version {expected}")]
    VersionGap { expected: u64, received: u64 },
}
