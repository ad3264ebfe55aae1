//! Bus ingest configuration

use crate::{get_env, lookup_env, Result};

/// MQTT broker and subscription settings for the collector.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker URL, e.g. `tcp://localhost:1883`
    pub url: String,
    /// Topic filter for sensor payloads
    pub topic: String,
}

impl MqttConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: get_env(&lookup_env, "MQTT_URL", "tcp://localhost:1883"),
            topic: get_env(&lookup_env, "MQTT_TOPIC", "cityflow/traffic/+"),
        })
    }
}
