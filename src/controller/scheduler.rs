use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{
    Aquarium, LightCommand, LightCommandBatch, LightingConfig, LightingConfigPatch,
    SimulationError,
};
use crate::publish::{LiveBroadcast, MessageBus};
use crate::repo::AquariumStore;
use crate::simulation::{self, DistributionPoint, LegacySunPayload, SimulationResult};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Aquarium {0} not found")]
    AquariumNotFound(Uuid),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("Aquarium store error: {0}")]
    Store(anyhow::Error),
}

/// Scheduler settings
#[derive(Debug, Clone)]
pub struct SunSchedulerConfig {
    /// Lighting applied to the default simulation and to aquariums without their own
    pub defaults: LightingConfig,
    pub timezone: Tz,
    /// Upper bound on a single aquarium store call
    pub fetch_timeout: Duration,
    pub sun_topic: String,
    pub light_topic: String,
}

impl Default for SunSchedulerConfig {
    fn default() -> Self {
        Self {
            defaults: LightingConfig::default(),
            timezone: chrono_tz::America::Toronto,
            fetch_timeout: Duration::from_secs(10),
            sun_topic: "aquarium/sun".to_string(),
            light_topic: "aquarium/lights".to_string(),
        }
    }
}

/// Task status tracking
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskStatus {
    pub last_run: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub run_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub skipped_count: u64,
}

/// Summary of one completed tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub default: SimulationResult,
    /// False when the aquarium fetch failed or timed out
    pub fetched: bool,
    pub aquariums_ok: usize,
    pub aquariums_failed: usize,
    pub commands: usize,
}

#[derive(Debug, Clone)]
pub enum TickOutcome {
    Completed(TickReport),
    /// A previous tick was still in flight
    Skipped,
}

/// Drives the simulated sun: samples it once per tick, keeps the latest
/// default result, and fans per-aquarium light commands out to the bus.
pub struct SunScheduler {
    config: SunSchedulerConfig,
    store: Arc<dyn AquariumStore>,
    bus: Arc<dyn MessageBus>,
    live: LiveBroadcast,
    latest: RwLock<Option<SimulationResult>>,
    status: RwLock<TaskStatus>,
    tick_guard: Mutex<()>,
}

impl SunScheduler {
    pub fn new(
        config: SunSchedulerConfig,
        store: Arc<dyn AquariumStore>,
        bus: Arc<dyn MessageBus>,
        live: LiveBroadcast,
    ) -> Self {
        Self {
            config,
            store,
            bus,
            live,
            latest: RwLock::new(None),
            status: RwLock::new(TaskStatus::default()),
            tick_guard: Mutex::new(()),
        }
    }

    pub fn defaults(&self) -> &LightingConfig {
        &self.config.defaults
    }

    /// Current wall-clock time in the configured zone
    pub fn local_now(&self) -> NaiveTime {
        Utc::now().with_timezone(&self.config.timezone).time()
    }

    /// Start the periodic loop: one tick right away, then on every period boundary
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        let period = period.max(Duration::from_secs(1));
        tokio::spawn(async move {
            self.run_tick().await;

            let elapsed = Utc::now().timestamp().rem_euclid(period.as_secs() as i64) as u64;
            let first = Instant::now() + Duration::from_secs(period.as_secs() - elapsed);
            let mut ticker = interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(period_secs = period.as_secs(), "sun scheduler started");
            loop {
                ticker.tick().await;
                self.run_tick().await;
            }
        })
    }

    pub async fn run_tick(&self) -> TickOutcome {
        self.tick_at(self.local_now()).await
    }

    /// Run one tick as if the local clock read `time`
    pub async fn tick_at(&self, time: NaiveTime) -> TickOutcome {
        let Ok(_guard) = self.tick_guard.try_lock() else {
            warn!("previous tick still running, skipping");
            self.status.write().skipped_count += 1;
            return TickOutcome::Skipped;
        };

        let started = Utc::now();
        {
            let mut status = self.status.write();
            status.last_run = Some(started);
            status.run_count += 1;
        }
        debug!(%time, "sun tick");

        let default = simulation::simulate(time, &self.config.defaults);
        *self.latest.write() = Some(default);

        self.publish_json(&self.config.sun_topic, &default.legacy()).await;

        let mut report = TickReport {
            default,
            fetched: false,
            aquariums_ok: 0,
            aquariums_failed: 0,
            commands: 0,
        };

        match self.fetch_all().await {
            Ok(aquariums) => {
                report.fetched = true;
                let mut batch = LightCommandBatch::default();
                for (id, outcome) in aquariums.iter().map(|a| (a.id, self.commands_for(a, time))) {
                    match outcome {
                        Ok(commands) => {
                            report.aquariums_ok += 1;
                            batch.lights.extend(commands);
                        }
                        Err(e) => {
                            report.aquariums_failed += 1;
                            warn!(aquarium_id = %id, error = %e, "skipping aquarium this tick");
                        }
                    }
                }
                report.commands = batch.lights.len();
                self.publish_json(&self.config.light_topic, &batch).await;
            }
            Err(e) => {
                error!(error = %e, "aquarium fetch failed, no light commands this tick");
            }
        }

        self.live.broadcast(default);

        {
            let mut status = self.status.write();
            if report.fetched {
                status.last_success = Some(started);
                status.success_count += 1;
                status.last_error = None;
            } else {
                status.error_count += 1;
                status.last_error = Some("aquarium fetch failed".to_string());
            }
        }

        info!(
            on = default.is_on,
            brightness = default.brightness_percent,
            time_of_day = %default.time_of_day,
            aquariums_ok = report.aquariums_ok,
            aquariums_failed = report.aquariums_failed,
            commands = report.commands,
            "sun tick complete"
        );
        TickOutcome::Completed(report)
    }

    /// Latest default result; `None` until the first tick has run
    pub fn latest(&self) -> Option<SimulationResult> {
        *self.latest.read()
    }

    pub fn latest_legacy(&self) -> Option<LegacySunPayload> {
        self.latest().map(|r| r.legacy())
    }

    pub fn status(&self) -> TaskStatus {
        self.status.read().clone()
    }

    /// Merge an optional per-aquarium config onto the defaults
    pub fn resolve(&self, patch: Option<&LightingConfigPatch>) -> Result<LightingConfig, SimulationError> {
        match patch {
            Some(p) => p.resolve(&self.config.defaults),
            None => Ok(self.config.defaults),
        }
    }

    pub fn simulate_for(
        &self,
        time: NaiveTime,
        config: &LightingConfig,
    ) -> Result<SimulationResult, SimulationError> {
        simulation::simulate_checked(time, config)
    }

    pub fn distribution(
        &self,
        patch: Option<&LightingConfigPatch>,
    ) -> Result<Vec<DistributionPoint>, SimulationError> {
        Ok(simulation::distribution(self.resolve(patch)?).collect())
    }

    /// Simulate an aquarium under its own config at the current local time
    pub async fn aquarium_simulation(&self, id: Uuid) -> Result<SimulationResult, SchedulerError> {
        let aquarium = self.fetch_one(id).await?;
        let config = self.resolve(aquarium.lighting_config.as_ref())?;
        Ok(simulation::simulate(self.local_now(), &config))
    }

    /// Push the current state of one aquarium's lights immediately, e.g.
    /// after its config was edited. Returns the number of commands sent.
    pub async fn recompute_and_publish(&self, id: Uuid) -> Result<usize, SchedulerError> {
        let aquarium = self.fetch_one(id).await?;
        let commands = self.commands_for(&aquarium, self.local_now())?;
        let count = commands.len();
        if count > 0 {
            self.publish_json(&self.config.light_topic, &LightCommandBatch { lights: commands })
                .await;
        }
        info!(aquarium_id = %id, commands = count, "pushed aquarium lights");
        Ok(count)
    }

    fn commands_for(
        &self,
        aquarium: &Aquarium,
        time: NaiveTime,
    ) -> Result<Vec<LightCommand>, SimulationError> {
        let config = self.resolve(aquarium.lighting_config.as_ref())?;
        let sim = simulation::simulate(time, &config);
        Ok(aquarium.light_commands(&sim))
    }

    async fn fetch_all(&self) -> anyhow::Result<Vec<Aquarium>> {
        match timeout(self.config.fetch_timeout, self.store.list_all()).await {
            Ok(result) => result,
            Err(_) => anyhow::bail!(
                "aquarium fetch timed out after {}ms",
                self.config.fetch_timeout.as_millis()
            ),
        }
    }

    async fn fetch_one(&self, id: Uuid) -> Result<Aquarium, SchedulerError> {
        match timeout(self.config.fetch_timeout, self.store.get(id)).await {
            Ok(Ok(Some(aquarium))) => Ok(aquarium),
            Ok(Ok(None)) => Err(SchedulerError::AquariumNotFound(id)),
            Ok(Err(e)) => Err(SchedulerError::Store(e)),
            Err(_) => Err(SchedulerError::Store(anyhow::anyhow!("aquarium lookup timed out"))),
        }
    }

    async fn publish_json<T: Serialize>(&self, topic: &str, value: &T) {
        let payload = match serde_json::to_vec(value) {
            Ok(p) => p,
            Err(e) => {
                error!(topic, error = %e, "failed to encode message");
                return;
            }
        };
        if let Err(e) = self.bus.publish(topic, payload).await {
            warn!(topic, error = %e, "publish failed");
        }
    }
}
