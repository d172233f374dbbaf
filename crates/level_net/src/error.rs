//! Errors raised by the level transport.

/// Everything that can go wrong sending or receiving a level message.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("failed to encode level message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode level message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// A delta's `msg-type` header disagrees with the delta it carries.
    #[error("delta labelled {found:?} carries a {expected:?} payload")]
    MsgType { expected: &'static str, found: String },

    #[error("NATS subscribe error: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),

    #[error("NATS publish error: {0}")]
    Publish(#[from] async_nats::PublishError),

    #[error("NATS connection error: {0}")]
    Connect(#[from] async_nats::ConnectError),

    #[error("NATS flush error: {0}")]
    Flush(#[from] async_nats::client::FlushError),
}
