//! Outbound sinks the scheduler fans results into: a topic-based message
//! bus for devices and a broadcast channel for live UI subscribers.

#[cfg(feature = "mqtt")]
pub mod mqtt;

use anyhow::Result;
use async_trait::async_trait;
#[cfg(any(test, feature = "test-util"))]
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::MqttConfig;
use crate::simulation::SimulationResult;

/// Fire-and-forget publish to a named topic
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;
}

/// Used when no broker is configured: logs and drops every message
#[derive(Debug, Default)]
pub struct LogOnlyBus;

#[async_trait]
impl MessageBus for LogOnlyBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        debug!(topic, bytes = payload.len(), "message bus disabled, dropping publish");
        Ok(())
    }
}

/// Keeps every published message in memory
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingBus {
    messages: Mutex<Vec<(String, Vec<u8>)>>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(String, Vec<u8>)> {
        self.messages.lock().clone()
    }

    /// Payloads published to `topic`, decoded as JSON
    pub fn json_on(&self, topic: &str) -> Vec<serde_json::Value> {
        self.messages
            .lock()
            .iter()
            .filter(|(t, _)| t == topic)
            .filter_map(|(_, p)| serde_json::from_slice(p).ok())
            .collect()
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl MessageBus for RecordingBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        self.messages.lock().push((topic.to_string(), payload));
        Ok(())
    }
}

/// Choose the bus implementation for the configured broker
pub fn message_bus(cfg: &MqttConfig) -> Result<Arc<dyn MessageBus>> {
    match cfg.host.as_deref() {
        #[cfg(feature = "mqtt")]
        Some(host) => Ok(Arc::new(mqtt::MqttBus::connect(cfg, host)?)),
        #[cfg(not(feature = "mqtt"))]
        Some(host) => {
            warn!(host, "built without the `mqtt` feature, device publishing disabled");
            Ok(Arc::new(LogOnlyBus))
        }
        None => {
            warn!("no MQTT broker configured, device publishing disabled");
            Ok(Arc::new(LogOnlyBus))
        }
    }
}

/// Live sun updates for WebSocket subscribers
#[derive(Clone)]
pub struct LiveBroadcast {
    tx: broadcast::Sender<SimulationResult>,
}

impl LiveBroadcast {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SimulationResult> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Never fails; having no subscribers is normal
    pub fn broadcast(&self, result: SimulationResult) {
        if let Ok(n) = self.tx.send(result) {
            debug!(subscribers = n, "sun update broadcast");
        }
    }
}
