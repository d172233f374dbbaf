//! The level's NATS link.
//!
//! [`NatsConnection`] only speaks the level protocol. Fixed-subject
//! [`LevelMessage`]s go out with [`NatsConnection::send`] and come back
//! through a typed [`Inbox`]. Registry deltas travel on a per-observer
//! subject with routing headers, through [`NatsConnection::send_delta`] and
//! a [`DeltaInbox`].

use std::marker::PhantomData;

use futures::StreamExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::codec::{decode, decode_delta, delta_headers, encode};
use crate::error::NetError;
use crate::messages::{LevelMessage, RegistryDeltaMessage};
use crate::subjects;

/// Default NATS server URL.
pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// The environment variable both binaries read the NATS URL from.
pub const NATS_URL_ENV: &str = "NATS_URL";

/// A NATS client that sends and receives level messages.
#[derive(Debug, Clone)]
pub struct NatsConnection {
    client: async_nats::Client,
}

impl NatsConnection {
    /// Connect to NATS at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the connection cannot be established.
    pub async fn connect_to(url: &str) -> Result<Self, NetError> {
        info!(url, "connecting to NATS");
        let client = async_nats::connect(url).await?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// Publish `message` on its own subject.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if encoding or publishing fails.
    pub async fn send<M: LevelMessage>(&self, message: &M) -> Result<(), NetError> {
        let payload = encode(message)?;
        self.client
            .publish(M::SUBJECT.to_string(), payload.into())
            .await?;
        Ok(())
    }

    /// Subscribe to every `M` published on the level.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Subscribe`] if the subscription fails.
    pub async fn inbox<M: LevelMessage>(&self) -> Result<Inbox<M>, NetError> {
        let subscriber = self.client.subscribe(M::SUBJECT.to_string()).await?;
        debug!(subject = M::SUBJECT, "inbox opened");
        Ok(Inbox {
            subscriber,
            _message: PhantomData,
        })
    }

    /// Publish a delta to one observer, with its routing headers.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if encoding or publishing fails.
    pub async fn send_delta(&self, observer_id: Uuid, message: &RegistryDeltaMessage) -> Result<(), NetError> {
        let payload = encode(message)?;
        let header_map = delta_headers(observer_id, message);
        self.client
            .publish_with_headers(
                subjects::registry_delta(&observer_id.to_string()),
                header_map,
                payload.into(),
            )
            .await?;
        Ok(())
    }

    /// Subscribe to the deltas addressed to `observer_id`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Subscribe`] if the subscription fails.
    pub async fn delta_inbox(&self, observer_id: Uuid) -> Result<DeltaInbox, NetError> {
        let subject = subjects::registry_delta(&observer_id.to_string());
        let subscriber = self.client.subscribe(subject.clone()).await?;
        debug!(subject = %subject, "delta inbox opened");
        Ok(DeltaInbox { subscriber })
    }

    /// Wait until every published message has reached the server.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Flush`] if the connection dropped.
    pub async fn flush(&self) -> Result<(), NetError> {
        self.client.flush().await?;
        Ok(())
    }
}

/// Subscription to one [`LevelMessage`] type.
#[derive(Debug)]
pub struct Inbox<M> {
    subscriber: async_nats::Subscriber,
    _message: PhantomData<fn() -> M>,
}

impl<M: LevelMessage> Inbox<M> {
    /// The next message, or `None` once the subscription closes. A payload
    /// that does not decode is handed back as an error.
    pub async fn next(&mut self) -> Option<Result<M, NetError>> {
        let message = self.subscriber.next().await?;
        Some(decode(&message.payload))
    }
}

/// Subscription to one observer's registry deltas.
#[derive(Debug)]
pub struct DeltaInbox {
    subscriber: async_nats::Subscriber,
}

impl DeltaInbox {
    /// The next delta, or `None` once the subscription closes.
    pub async fn next(&mut self) -> Option<Result<RegistryDeltaMessage, NetError>> {
        let message = self.subscriber.next().await?;
        Some(decode_delta(message.headers.as_ref(), &message.payload))
    }
}
