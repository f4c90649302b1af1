use anyhow::Result;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tracing::{info, warn};

use super::MessageBus;
use crate::config::MqttConfig;

const REQUEST_CAPACITY: usize = 64;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// MQTT publisher. The event loop runs on its own task and reconnects
/// after connection errors.
pub struct MqttBus {
    client: AsyncClient,
}

impl MqttBus {
    pub fn connect(cfg: &MqttConfig, host: &str) -> Result<Self> {
        let mut options = MqttOptions::new(cfg.client_id.clone(), host, cfg.port);
        options.set_keep_alive(Duration::from_secs(cfg.keep_alive_secs.max(5)));

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        info!(host, port = cfg.port, "connecting to MQTT broker");

        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => info!("connected to MQTT broker"),
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "MQTT connection error, retrying");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        });

        Ok(Self { client })
    }
}

#[async_trait]
impl MessageBus for MqttBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        // Queue without waiting so a stalled broker cannot hold up a tick
        self.client.try_publish(topic, QoS::AtLeastOnce, false, payload)?;
        Ok(())
    }
}
