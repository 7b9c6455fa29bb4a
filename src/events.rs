//! Publishes domain events to NATS after the writes that raised them commit.

use async_nats::Client;

use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<Client>) -> Self { Self { nats } }

    /// A publisher that drops every event.
    pub fn disabled() -> Self { Self::default() }

    /// Connects to `url`, or returns a disabled publisher if there is no url or the connection fails.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::disabled() };
        match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(%url, "connected to NATS");
                Self::new(Some(client))
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "NATS unavailable, domain events will not be published");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool { self.nats.is_some() }

    /// Publishes each event as JSON on its subject. Failures are logged, never returned.
    pub async fn publish_all(&self, events: Vec<DomainEvent>) {
        let Some(client) = &self.nats else { return };
        for event in events {
            let subject = event.subject();
            let payload = match serde_json::to_vec(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!(subject, error = %e, "failed to encode domain event");
                    continue;
                }
            };
            if let Err(e) = client.publish(subject.to_string(), payload.into()).await {
                tracing::warn!(subject, error = %e, "failed to publish domain event");
            }
        }
    }
}
