//! MQTT ingest loop
//!
//! One listener task drives the MQTT event loop and dispatches a short
//! task per delivered message. QoS 0 is adequate: storage is idempotent on
//! `(ts, sensor_id)`, so bus redelivery after a reconnect is harmless.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use cityflow_cache::Cache;
use cityflow_config::MqttConfig;
use cityflow_metrics::StageMetrics;
use cityflow_storage::TrafficStore;
use cityflow_types::{channels, RawTrafficPayload};

/// Delay before re-polling the event loop after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Channel capacity for the MQTT client's request queue.
const CLIENT_QUEUE_CAPACITY: usize = 64;

/// Errors from broker URL parsing
#[derive(Debug, Error, PartialEq)]
pub enum BrokerUrlError {
    /// URL scheme is not one the collector speaks
    #[error("unsupported broker URL scheme in '{0}': expected tcp:// or mqtt://")]
    UnsupportedScheme(String),

    /// Port part is not a number
    #[error("invalid broker port in '{0}'")]
    InvalidPort(String),
}

/// The MQTT ingest stage.
pub struct MqttIngest {
    topic: String,
    host: String,
    port: u16,
    store: TrafficStore,
    cache: Cache,
    metrics: Arc<StageMetrics>,
}

impl MqttIngest {
    /// Build the stage, validating the broker URL up front so a bad
    /// `MQTT_URL` is a startup error rather than a silent idle process.
    pub fn new(
        config: MqttConfig,
        store: TrafficStore,
        cache: Cache,
        metrics: Arc<StageMetrics>,
    ) -> Result<Self, BrokerUrlError> {
        let (host, port) = parse_broker_url(&config.url)?;
        Ok(Self {
            topic: config.topic,
            host,
            port,
            store,
            cache,
            metrics,
        })
    }

    /// Run until cancelled.
    ///
    /// The event loop reconnects on its own; this loop re-subscribes on
    /// every ConnAck so a broker restart never silently drops the
    /// subscription.
    pub async fn run(self, cancel: CancellationToken) {
        // Timestamped client id: a restarted collector never collides with
        // its previous, not-yet-expired broker session.
        let client_id = format!("collector-{}", Utc::now().format("%Y%m%d%H%M%S"));
        let mut options = MqttOptions::new(client_id, self.host.clone(), self.port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut eventloop) = AsyncClient::new(options, CLIENT_QUEUE_CAPACITY);
        let topic = self.topic.clone();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        match client.subscribe(topic.as_str(), QoS::AtMostOnce).await {
                            Ok(()) => info!(topic = %topic, "collector subscribed"),
                            Err(err) => warn!(error = %err, "mqtt subscribe error"),
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let store = self.store.clone();
                        let cache = self.cache.clone();
                        let metrics = self.metrics.clone();
                        tokio::spawn(async move {
                            process_message(&store, &cache, &metrics, &publish.payload).await;
                        });
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "mqtt connection lost");
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                        }
                    }
                }
            }
        }

        let _ = client.disconnect().await;
    }
}

/// Handle one delivered payload end to end.
async fn process_message(
    store: &TrafficStore,
    cache: &Cache,
    metrics: &StageMetrics,
    payload: &[u8],
) {
    metrics.received.inc();

    let raw = match RawTrafficPayload::decode(payload) {
        Ok(raw) => raw,
        Err(err) => {
            metrics.failed.inc();
            warn!(error = %err, "invalid payload");
            return;
        }
    };

    let sample = match raw.into_sample(Utc::now()) {
        Ok(sample) => sample,
        Err(err) => {
            metrics.failed.inc();
            warn!(error = %err, "missing required fields in payload");
            return;
        }
    };

    // No retry on store errors: with persistent sessions the bus redelivers
    // and the insert is idempotent.
    if let Err(err) = store.insert(&sample).await {
        metrics.failed.inc();
        error!(error = %err, sensor_id = %sample.sensor_id, "db insert failed");
        return;
    }

    metrics.stored.inc();

    // Mirror the payload bytes exactly as received; consumers of the live
    // channel get untrusted structure.
    if let Err(err) = cache.publish_raw(channels::LIVE, payload).await {
        debug!(error = %err, "live publish failed");
    }
}

/// Split a `tcp://host:port` or `mqtt://host:port` broker URL.
fn parse_broker_url(url: &str) -> Result<(String, u16), BrokerUrlError> {
    let rest = url
        .strip_prefix("tcp://")
        .or_else(|| url.strip_prefix("mqtt://"))
        .ok_or_else(|| BrokerUrlError::UnsupportedScheme(url.to_string()))?;

    match rest.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse()
                .map_err(|_| BrokerUrlError::InvalidPort(url.to_string()))?;
            Ok((host.to_string(), port))
        }
        None => Ok((rest.to_string(), 1883)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_broker_url() {
        assert_eq!(
            parse_broker_url("tcp://localhost:1883").unwrap(),
            ("localhost".to_string(), 1883)
        );
        assert_eq!(
            parse_broker_url("mqtt://broker.internal:8883").unwrap(),
            ("broker.internal".to_string(), 8883)
        );
        assert_eq!(
            parse_broker_url("tcp://broker").unwrap(),
            ("broker".to_string(), 1883)
        );
    }

    #[test]
    fn test_parse_broker_url_rejects_bad_input() {
        assert!(matches!(
            parse_broker_url("http://localhost:1883"),
            Err(BrokerUrlError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            parse_broker_url("tcp://localhost:abc"),
            Err(BrokerUrlError::InvalidPort(_))
        ));
    }
}
