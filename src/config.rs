use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use figment::{providers::{Env, Format, Serialized, Toml}, Figment};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::domain::{LightingConfig, LightingConfigPatch};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub scheduler: SchedulerConfig,
    pub mqtt: MqttConfig,
    /// Process-wide default lighting, used for aquariums without their own config
    pub lighting: LightingConfig,
    #[serde(default)]
    pub aquariums: Vec<AquariumSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub cors_origin: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            enable_cors: true,
            cors_origin: "http://localhost:3001".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub tick_seconds: u64,
    pub fetch_timeout_secs: u64,
    /// IANA zone the simulated day follows
    pub timezone: String,
    pub broadcast_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 60,
            fetch_timeout_secs: 10,
            timezone: "America/Toronto".to_string(),
            broadcast_capacity: 16,
        }
    }
}

impl SchedulerConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid timezone {:?}: {}", self.timezone, e))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker host; publishing is disabled when unset
    pub host: Option<String>,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
    /// Topic for the default sun state
    pub sun_topic: String,
    /// Topic for the consolidated per-light command batch
    pub light_topic: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 1883,
            client_id: "aquarium-daylight".to_string(),
            keep_alive_secs: 30,
            sun_topic: "aquarium/sun".to_string(),
            light_topic: "aquarium/lights".to_string(),
        }
    }
}

/// Aquarium preloaded into the store at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AquariumSeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lighting_config: Option<LightingConfigPatch>,
    #[serde(default)]
    pub lights: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("AQD__").split("__"));
        let cfg: Config = figment.extract()?;
        cfg.lighting
            .validate_config()
            .map_err(|e| anyhow!("[lighting] section: {e}"))?;
        cfg.scheduler.tz()?;
        Ok(cfg)
    }
}
