pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{Aquarium, AquariumPatch, LightEntity};

pub use memory::InMemoryStore;

/// Failures of the write paths that callers are expected to handle
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("aquarium {0} not found")]
    AquariumNotFound(Uuid),

    #[error("light {0} not found")]
    LightNotFound(String),

    #[error("light {0} already exists")]
    LightExists(String),

    #[error("light {entity_id} is assigned to aquarium {owner}")]
    LightTaken { entity_id: String, owner: Uuid },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence seam for aquariums and their attached lights.
///
/// Every write that touches light ownership runs as one step in the store,
/// so a light can never end up attached to two aquariums.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AquariumStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Aquarium>>;
    async fn get(&self, id: Uuid) -> Result<Option<Aquarium>>;
    /// Fails with `LightTaken` if any attached light belongs elsewhere
    async fn insert(&self, aquarium: Aquarium) -> StoreResult<Aquarium>;
    async fn patch(&self, id: Uuid, patch: AquariumPatch) -> StoreResult<Aquarium>;
    async fn remove(&self, id: Uuid) -> Result<bool>;
    /// Attach a light, registering it when unknown. Idempotent for the owner.
    async fn assign_light(&self, id: Uuid, entity_id: &str) -> StoreResult<Aquarium>;
    async fn unassign_light(&self, id: Uuid, entity_id: &str) -> StoreResult<Aquarium>;
}

/// Registry of known lights keyed by entity id
#[async_trait]
pub trait LightStore: Send + Sync {
    async fn list_lights(&self) -> Result<Vec<LightEntity>>;
    async fn get_light(&self, entity_id: &str) -> Result<Option<LightEntity>>;
    async fn create_light(&self, light: LightEntity) -> StoreResult<LightEntity>;
    /// Replace `entity_data` and bump `last_updated`
    async fn update_light(
        &self,
        entity_id: &str,
        entity_data: serde_json::Value,
    ) -> StoreResult<LightEntity>;
    /// Refuses lights still attached to an aquarium
    async fn remove_light(&self, entity_id: &str) -> StoreResult<()>;
}

pub struct Repositories {
    pub aquariums: Arc<dyn AquariumStore>,
    pub lights: Arc<dyn LightStore>,
}

impl Repositories {
    /// Both seams backed by one in-memory store
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            aquariums: store.clone(),
            lights: store,
        }
    }

    pub async fn new(cfg: &Config) -> Result<Self> {
        let store = Arc::new(InMemoryStore::new());
        for seed in &cfg.aquariums {
            let mut aquarium = Aquarium::new(seed.name.clone());
            aquarium.description = seed.description.clone();
            aquarium.lighting_config = seed.lighting_config;
            aquarium.attach_lights(seed.lights.iter().cloned());
            store.insert(aquarium).await?;
        }

        tracing::info!(count = cfg.aquariums.len(), "seeded aquarium store");

        Ok(Self::in_memory(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AquariumSeed;

    fn seed(name: &str, lights: &[&str]) -> AquariumSeed {
        AquariumSeed {
            name: name.into(),
            description: None,
            lighting_config: None,
            lights: lights.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_seeding_registers_lights() {
        let cfg = Config {
            aquariums: vec![seed("Planted", &["light.a", "light.a"]), seed("Reef", &["light.b"])],
            ..Default::default()
        };
        let repos = Repositories::new(&cfg).await.unwrap();
        assert_eq!(repos.aquariums.list_all().await.unwrap().len(), 2);

        let lights = repos.lights.list_lights().await.unwrap();
        assert_eq!(lights.len(), 2);
        assert!(lights.iter().all(LightEntity::is_assigned));
    }

    #[tokio::test]
    async fn test_seeding_rejects_shared_light() {
        let cfg = Config {
            aquariums: vec![seed("A", &["light.shared"]), seed("B", &["light.shared"])],
            ..Default::default()
        };
        assert!(Repositories::new(&cfg).await.is_err());
    }
}
