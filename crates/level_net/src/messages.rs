//! Message types exchanged between the level server and its observers.
//!
//! All message types derive `Serialize` and `Deserialize` for MessagePack
//! transport. Routing metadata (tick-id, observer-id, msg-type) is carried
//! in NATS headers, not in the payload.

use level_math::Placement;
use level_registry::RegistryDelta;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subjects;

/// A message that always travels on the same subject.
pub trait LevelMessage: Serialize + DeserializeOwned {
    const SUBJECT: &'static str;
}

// ── Observer lifecycle ──────────────────────────────────────────────────────

/// An observer asks to start receiving registry deltas.
/// Published on [`subjects::OBSERVER_JOIN`](crate::subjects::OBSERVER_JOIN).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverJoin {
    pub observer_id: Uuid,
}

/// An observer stops receiving deltas.
/// Published on [`subjects::OBSERVER_LEAVE`](crate::subjects::OBSERVER_LEAVE).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverLeave {
    pub observer_id: Uuid,
}

/// An observer applied every delta up to `version`.
/// Published on [`subjects::OBSERVER_ACK`](crate::subjects::OBSERVER_ACK).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaAck {
    pub observer_id: Uuid,
    pub version: u64,
}

/// An observer rejected a delta because of a version gap and needs a full
/// snapshot. `version` is the replica version it is stuck at.
/// Published on [`subjects::OBSERVER_RESYNC`](crate::subjects::OBSERVER_RESYNC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResyncRequest {
    pub observer_id: Uuid,
    pub version: u64,
}

// ── Level state ─────────────────────────────────────────────────────────────

/// A registry delta for one observer, published on
/// `level.registry.delta.<observer_id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDeltaMessage {
    /// Tick in which the delta was computed.
    pub tick_id: u64,
    pub delta: RegistryDelta,
}

/// The board placement. Observers rebuild their grid from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    pub tick_id: u64,
    pub placement: Placement,
}

/// The level ended. Observers drop their replica and proxies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelEnded {
    pub tick_id: u64,
}

impl LevelMessage for ObserverJoin {
    const SUBJECT: &'static str = subjects::OBSERVER_JOIN;
}

impl LevelMessage for ObserverLeave {
    const SUBJECT: &'static str = subjects::OBSERVER_LEAVE;
}

impl LevelMessage for DeltaAck {
    const SUBJECT: &'static str = subjects::OBSERVER_ACK;
}

impl LevelMessage for ResyncRequest {
    const SUBJECT: &'static str = subjects::OBSERVER_RESYNC;
}

impl LevelMessage for BoardState {
    const SUBJECT: &'static str = subjects::BOARD;
}

impl LevelMessage for LevelEnded {
    const SUBJECT: &'static str = subjects::LEVEL_END;
}

// ── NATS header keys ────────────────────────────────────────────────────────

/// Standard NATS header keys used for routing metadata.
pub mod headers {
    /// The message type (e.g. `"registry_delta"`, `"full_snapshot"`).
    pub const MSG_TYPE: &str = "msg-type";
    /// The tick ID this message belongs to.
    pub const TICK_ID: &str = "tick-id";
    /// The observer the message is addressed to or sent by.
    pub const OBSERVER_ID: &str = "observer-id";
}

/// Header value for an incremental [`RegistryDeltaMessage`].
pub const REGISTRY_DELTA_MSG_TYPE: &str = "registry_delta";

/// Header value for a [`RegistryDeltaMessage`] carrying a full snapshot.
pub const FULL_SNAPSHOT_MSG_TYPE: &str = "full_snapshot";

#[cfg(test)]
mod tests {
    use level_component::{ActorType, MapHandle};
    use level_math::{Cell, Vec3};
    use level_registry::ReplicatedItem;

    use super::*;

    #[test]
    fn test_delta_message_roundtrip() {
        let msg = RegistryDeltaMessage {
            tick_id: 12,
            delta: RegistryDelta {
                base_version: 3,
                version: 5,
                changed: vec![ReplicatedItem {
                    id: 4,
                    key: 2,
                    module: MapHandle::from_raw_parts(1, 1),
                    actor_type: ActorType::Player,
                    cell: Cell::from_xyz(200.0, 0.0, 0.0),
                }],
                removed: vec![2],
                full: false,
            },
        };
        let bytes = crate::encode(&msg).unwrap();
        let restored: RegistryDeltaMessage = crate::decode(&bytes).unwrap();
        assert_eq!(restored, msg);
    }

    #[test]
    fn test_ack_roundtrip() {
        let msg = DeltaAck {
            observer_id: Uuid::new_v4(),
            version: 77,
        };
        let bytes = crate::encode(&msg).unwrap();
        let restored: DeltaAck = crate::decode(&bytes).unwrap();
        assert_eq!(restored, msg);
    }

    #[test]
    fn test_messages_use_distinct_subjects() {
        let subjects = [
            ObserverJoin::SUBJECT,
            ObserverLeave::SUBJECT,
            DeltaAck::SUBJECT,
            ResyncRequest::SUBJECT,
            BoardState::SUBJECT,
            LevelEnded::SUBJECT,
        ];
        for (i, a) in subjects.iter().enumerate() {
            for b in &subjects[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(BoardState::SUBJECT, "level.board");
    }

    #[test]
    fn test_board_state_roundtrip() {
        let msg = BoardState {
            tick_id: 1,
            placement: Placement::board(Vec3::new(0.0, 400.0, 0.0), 90.0, 9, 7),
        };
        let bytes = crate::encode(&msg).unwrap();
        let restored: BoardState = crate::decode(&bytes).unwrap();
        assert_eq!(restored, msg);
    }
}
