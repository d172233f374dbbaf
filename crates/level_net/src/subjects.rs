//! NATS subject hierarchy.
//!
//! All level subjects are prefixed with `level.` to namespace within a
//! shared NATS cluster.

/// Root prefix for all level NATS subjects.
pub const PREFIX: &str = "level";

// ── Observer lifecycle ──────────────────────────────────────────────────────

/// An observer announces itself. Observer → Server.
pub const OBSERVER_JOIN: &str = "level.observer.join";

/// An observer leaves. Observer → Server.
pub const OBSERVER_LEAVE: &str = "level.observer.leave";

/// An observer confirms it applied a delta. Observer → Server.
pub const OBSERVER_ACK: &str = "level.observer.ack";

/// An observer detected a version gap and needs a full snapshot.
/// Observer → Server.
pub const OBSERVER_RESYNC: &str = "level.observer.resync";

// ── Level state ─────────────────────────────────────────────────────────────

/// Board placement broadcast on join and after every resize. Server → *.
pub const BOARD: &str = "level.board";

/// The level ended and its registry was cleared. Server → *.
pub const LEVEL_END: &str = "level.end";

// ── Dynamic subject builders ────────────────────────────────────────────────

/// Build the subject carrying registry deltas for one observer.
///
/// `level.registry.delta.<observer_id>`
#[must_use]
pub fn registry_delta(observer_id: &str) -> String {
    format!("{PREFIX}.registry.delta.{observer_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_delta_subject() {
        assert_eq!(registry_delta("obs-1"), "level.registry.delta.obs-1");
    }

    #[test]
    fn test_static_subjects_share_prefix() {
        for subject in [OBSERVER_JOIN, OBSERVER_LEAVE, OBSERVER_ACK, OBSERVER_RESYNC, BOARD, LEVEL_END] {
            assert!(subject.starts_with(PREFIX));
        }
    }
}
