pub mod scheduler;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::publish::{self, LiveBroadcast, MessageBus};
use crate::repo::Repositories;

pub use scheduler::{
    SchedulerError, SunScheduler, SunSchedulerConfig, TaskStatus, TickOutcome, TickReport,
};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub scheduler: Arc<SunScheduler>,
    pub repos: Arc<Repositories>,
    pub live: LiveBroadcast,
}

impl AppState {
    pub async fn new(cfg: Config) -> Result<Self> {
        let repos = Repositories::new(&cfg).await?;
        let bus = publish::message_bus(&cfg.mqtt)?;
        Self::from_parts(cfg, repos, bus)
    }

    /// Wire the scheduler around explicit repositories and bus
    pub fn from_parts(
        cfg: Config,
        repos: Repositories,
        bus: Arc<dyn MessageBus>,
    ) -> Result<Self> {
        let live = LiveBroadcast::new(cfg.scheduler.broadcast_capacity);
        let scheduler_cfg = SunSchedulerConfig {
            defaults: cfg.lighting,
            timezone: cfg.scheduler.tz()?,
            fetch_timeout: Duration::from_secs(cfg.scheduler.fetch_timeout_secs.max(1)),
            sun_topic: cfg.mqtt.sun_topic.clone(),
            light_topic: cfg.mqtt.light_topic.clone(),
        };
        let scheduler = Arc::new(SunScheduler::new(
            scheduler_cfg,
            repos.aquariums.clone(),
            bus,
            live.clone(),
        ));

        Ok(Self {
            cfg,
            scheduler,
            repos: Arc::new(repos),
            live,
        })
    }
}

pub fn spawn_controller_tasks(state: AppState, cfg: Config) {
    info!(
        tick_seconds = cfg.scheduler.tick_seconds,
        timezone = %cfg.scheduler.timezone,
        "starting sun scheduler"
    );
    state
        .scheduler
        .clone()
        .spawn(Duration::from_secs(cfg.scheduler.tick_seconds));
}
