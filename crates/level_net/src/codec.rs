//! Payload and header codec for the level protocol.
//!
//! Payloads are MessagePack, encoded with `rmp-serde`. A registry delta
//! also carries routing metadata in NATS headers: [`delta_headers`] writes
//! them on the server and [`decode_delta`] checks them on the observer.

use async_nats::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::NetError;
use crate::messages::{FULL_SNAPSHOT_MSG_TYPE, REGISTRY_DELTA_MSG_TYPE, RegistryDeltaMessage, headers};

/// Encode a level message to MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, NetError> {
    rmp_serde::to_vec(value).map_err(NetError::Encode)
}

/// Decode a level message from MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Decode`] if deserialisation fails.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, NetError> {
    rmp_serde::from_slice(bytes).map_err(NetError::Decode)
}

/// The `msg-type` header value for a delta.
#[must_use]
pub fn delta_msg_type(message: &RegistryDeltaMessage) -> &'static str {
    if message.delta.full {
        FULL_SNAPSHOT_MSG_TYPE
    } else {
        REGISTRY_DELTA_MSG_TYPE
    }
}

/// Routing headers for a delta addressed to `observer_id`.
#[must_use]
pub fn delta_headers(observer_id: Uuid, message: &RegistryDeltaMessage) -> HeaderMap {
    let mut header_map = HeaderMap::new();
    header_map.insert(headers::MSG_TYPE, delta_msg_type(message));
    header_map.insert(headers::TICK_ID, message.tick_id.to_string().as_str());
    header_map.insert(headers::OBSERVER_ID, observer_id.to_string().as_str());
    header_map
}

/// Decode a delta and check its `msg-type` header against the payload.
/// A delta without headers is accepted as is.
///
/// # Errors
///
/// Returns [`NetError::Decode`] for a malformed payload and
/// [`NetError::MsgType`] when the header names the other kind of delta.
pub fn decode_delta(header_map: Option<&HeaderMap>, payload: &[u8]) -> Result<RegistryDeltaMessage, NetError> {
    let message: RegistryDeltaMessage = decode(payload)?;
    let expected = delta_msg_type(&message);
    if let Some(found) = header_map.and_then(|map| map.get(headers::MSG_TYPE)) {
        if found.as_str() != expected {
            return Err(NetError::MsgType {
                expected,
                found: found.as_str().to_string(),
            });
        }
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use level_math::Cell;
    use level_registry::RegistryDelta;

    use super::*;

    fn snapshot(full: bool) -> RegistryDeltaMessage {
        RegistryDeltaMessage {
            tick_id: 9,
            delta: RegistryDelta {
                base_version: 0,
                version: 4,
                changed: Vec::new(),
                removed: Vec::new(),
                full,
            },
        }
    }

    #[test]
    fn test_cell_encodes_as_location() {
        let cell = Cell::from_xyz(200.0, -400.0, 0.0);
        let bytes = encode(&cell).unwrap();
        let restored: Cell = decode(&bytes).unwrap();
        assert_eq!(restored, cell);
    }

    #[test]
    fn test_decode_invalid_bytes() {
        let result: Result<Cell, _> = decode(&[0xFF, 0xFF]);
        assert!(matches!(result, Err(NetError::Decode(_))));
    }

    #[test]
    fn test_delta_headers_carry_routing() {
        let observer_id = Uuid::new_v4();
        let header_map = delta_headers(observer_id, &snapshot(true));
        let observer = observer_id.to_string();
        assert_eq!(header_map.get(headers::MSG_TYPE).unwrap().as_str(), FULL_SNAPSHOT_MSG_TYPE);
        assert_eq!(header_map.get(headers::TICK_ID).unwrap().as_str(), "9");
        assert_eq!(header_map.get(headers::OBSERVER_ID).unwrap().as_str(), observer);
    }

    #[test]
    fn test_decode_delta_checks_msg_type() {
        let message = snapshot(false);
        let payload = encode(&message).unwrap();

        let header_map = delta_headers(Uuid::new_v4(), &message);
        assert_eq!(decode_delta(Some(&header_map), &payload).unwrap(), message);
        assert_eq!(decode_delta(None, &payload).unwrap(), message);

        let mismatched = delta_headers(Uuid::new_v4(), &snapshot(true));
        assert!(matches!(
            decode_delta(Some(&mismatched), &payload),
            Err(NetError::MsgType { expected: REGISTRY_DELTA_MSG_TYPE, .. })
        ));
    }
}
