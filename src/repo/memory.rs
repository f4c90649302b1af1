use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AquariumStore, LightStore, StoreError, StoreResult};
use crate::domain::{Aquarium, AquariumPatch, LightEntity};

#[derive(Default)]
struct Tables {
    aquariums: BTreeMap<Uuid, Aquarium>,
    lights: BTreeMap<String, LightEntity>,
}

impl Tables {
    fn check_free(&self, entity_id: &str, owner: Uuid) -> StoreResult<()> {
        match self.lights.get(entity_id).and_then(|l| l.aquarium_id) {
            Some(other) if other != owner => Err(StoreError::LightTaken {
                entity_id: entity_id.to_string(),
                owner: other,
            }),
            _ => Ok(()),
        }
    }

    fn claim(&mut self, entity_id: &str, owner: Uuid) {
        self.lights
            .entry(entity_id.to_string())
            .or_insert_with(|| LightEntity::new(entity_id))
            .aquarium_id = Some(owner);
    }

    fn release(&mut self, entity_id: &str) {
        if let Some(light) = self.lights.get_mut(entity_id) {
            light.aquarium_id = None;
        }
    }
}

/// Process-local store for aquariums and the light registry; contents are
/// lost on restart. One lock covers both tables.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefilled store; a light listed on several aquariums goes to the last one
    pub fn with_aquariums(aquariums: impl IntoIterator<Item = Aquarium>) -> Self {
        let mut tables = Tables::default();
        for aquarium in aquariums {
            for light in &aquarium.lights {
                tables.claim(&light.entity_id, aquarium.id);
            }
            tables.aquariums.insert(aquarium.id, aquarium);
        }
        Self {
            tables: RwLock::new(tables),
        }
    }
}

#[async_trait]
impl AquariumStore for InMemoryStore {
    async fn list_all(&self) -> Result<Vec<Aquarium>> {
        Ok(self.tables.read().await.aquariums.values().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Aquarium>> {
        Ok(self.tables.read().await.aquariums.get(&id).cloned())
    }

    async fn insert(&self, aquarium: Aquarium) -> StoreResult<Aquarium> {
        let mut tables = self.tables.write().await;
        if tables.aquariums.contains_key(&aquarium.id) {
            return Err(anyhow!("aquarium {} already exists", aquarium.id).into());
        }
        for light in &aquarium.lights {
            tables.check_free(&light.entity_id, aquarium.id)?;
        }
        for light in &aquarium.lights {
            tables.claim(&light.entity_id, aquarium.id);
        }
        tables.aquariums.insert(aquarium.id, aquarium.clone());
        Ok(aquarium)
    }

    async fn patch(&self, id: Uuid, patch: AquariumPatch) -> StoreResult<Aquarium> {
        let mut tables = self.tables.write().await;
        let aquarium = tables
            .aquariums
            .get_mut(&id)
            .ok_or(StoreError::AquariumNotFound(id))?;
        patch.apply(aquarium);
        Ok(aquarium.clone())
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(aquarium) = tables.aquariums.remove(&id) else {
            return Ok(false);
        };
        for light in &aquarium.lights {
            tables.release(&light.entity_id);
        }
        Ok(true)
    }

    async fn assign_light(&self, id: Uuid, entity_id: &str) -> StoreResult<Aquarium> {
        let mut tables = self.tables.write().await;
        match tables.aquariums.get(&id) {
            None => return Err(StoreError::AquariumNotFound(id)),
            Some(a) if a.has_light(entity_id) => return Ok(a.clone()),
            Some(_) => {}
        }
        tables.check_free(entity_id, id)?;
        tables.claim(entity_id, id);

        let aquarium = tables
            .aquariums
            .get_mut(&id)
            .ok_or(StoreError::AquariumNotFound(id))?;
        aquarium.attach_lights([entity_id]);
        Ok(aquarium.clone())
    }

    async fn unassign_light(&self, id: Uuid, entity_id: &str) -> StoreResult<Aquarium> {
        let mut tables = self.tables.write().await;
        let aquarium = tables
            .aquariums
            .get_mut(&id)
            .ok_or(StoreError::AquariumNotFound(id))?;
        if !aquarium.has_light(entity_id) {
            return Err(StoreError::LightNotFound(entity_id.to_string()));
        }
        aquarium.lights.retain(|l| l.entity_id != entity_id);
        let updated = aquarium.clone();
        tables.release(entity_id);
        Ok(updated)
    }
}

#[async_trait]
impl LightStore for InMemoryStore {
    async fn list_lights(&self) -> Result<Vec<LightEntity>> {
        Ok(self.tables.read().await.lights.values().cloned().collect())
    }

    async fn get_light(&self, entity_id: &str) -> Result<Option<LightEntity>> {
        Ok(self.tables.read().await.lights.get(entity_id).cloned())
    }

    async fn create_light(&self, mut light: LightEntity) -> StoreResult<LightEntity> {
        let mut tables = self.tables.write().await;
        if tables.lights.contains_key(&light.entity_id) {
            return Err(StoreError::LightExists(light.entity_id));
        }
        // ownership only changes through assign/unassign
        light.aquarium_id = None;
        tables.lights.insert(light.entity_id.clone(), light.clone());
        Ok(light)
    }

    async fn update_light(
        &self,
        entity_id: &str,
        entity_data: serde_json::Value,
    ) -> StoreResult<LightEntity> {
        let mut tables = self.tables.write().await;
        let light = tables
            .lights
            .get_mut(entity_id)
            .ok_or_else(|| StoreError::LightNotFound(entity_id.to_string()))?;
        light.refresh(entity_data);
        Ok(light.clone())
    }

    async fn remove_light(&self, entity_id: &str) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.lights.get(entity_id) {
            None => Err(StoreError::LightNotFound(entity_id.to_string())),
            Some(LightEntity {
                aquarium_id: Some(owner),
                ..
            }) => Err(StoreError::LightTaken {
                entity_id: entity_id.to_string(),
                owner: *owner,
            }),
            Some(_) => {
                tables.lights.remove(entity_id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let store = InMemoryStore::new();
        let tank = store.insert(Aquarium::new("Planted 55")).await.unwrap();

        assert_eq!(store.list_all().await.unwrap().len(), 1);
        assert_eq!(store.get(tank.id).await.unwrap().unwrap().name, "Planted 55");

        let renamed = AquariumPatch {
            name: Some("Planted 75".to_string()),
            ..Default::default()
        };
        assert_eq!(store.patch(tank.id, renamed).await.unwrap().name, "Planted 75");
        assert_eq!(store.get(tank.id).await.unwrap().unwrap().name, "Planted 75");

        assert!(store.remove(tank.id).await.unwrap());
        assert!(!store.remove(tank.id).await.unwrap());
        assert!(store.get(tank.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_patch_unknown_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.patch(Uuid::new_v4(), AquariumPatch::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::AquariumNotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let tank = Aquarium::new("Reef");
        let store = InMemoryStore::with_aquariums([tank.clone()]);
        assert!(matches!(store.insert(tank).await, Err(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn test_insert_rejects_light_owned_elsewhere() {
        let store = InMemoryStore::new();
        let mut first = Aquarium::new("A");
        first.attach_lights(["light.shared"]);
        let first = store.insert(first).await.unwrap();

        let mut second = Aquarium::new("B");
        second.attach_lights(["light.own", "light.shared"]);
        let err = store.insert(second).await.unwrap_err();
        assert!(matches!(err, StoreError::LightTaken { owner, .. } if owner == first.id));

        // nothing from the rejected insert leaks into the registry
        assert!(store.get_light("light.own").await.unwrap().is_none());
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_assign_and_unassign_track_ownership() {
        let store = InMemoryStore::new();
        let a = store.insert(Aquarium::new("A")).await.unwrap();
        let b = store.insert(Aquarium::new("B")).await.unwrap();

        let updated = store.assign_light(a.id, "light.x").await.unwrap();
        assert!(updated.has_light("light.x"));
        assert_eq!(
            store.get_light("light.x").await.unwrap().unwrap().aquarium_id,
            Some(a.id)
        );
        // repeat is a no-op
        assert_eq!(store.assign_light(a.id, "light.x").await.unwrap().lights.len(), 1);

        let err = store.assign_light(b.id, "light.x").await.unwrap_err();
        assert!(matches!(err, StoreError::LightTaken { .. }));

        store.unassign_light(a.id, "light.x").await.unwrap();
        assert!(!store.get_light("light.x").await.unwrap().unwrap().is_assigned());
        assert!(matches!(
            store.unassign_light(a.id, "light.x").await,
            Err(StoreError::LightNotFound(_))
        ));
        assert!(store.assign_light(b.id, "light.x").await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_assign_has_single_winner() {
        for _ in 0..50 {
            let store = Arc::new(InMemoryStore::new());
            let a = store.insert(Aquarium::new("A")).await.unwrap();
            let b = store.insert(Aquarium::new("B")).await.unwrap();

            let (ra, rb) = tokio::join!(
                tokio::spawn({
                    let store = store.clone();
                    async move { store.assign_light(a.id, "light.x").await }
                }),
                tokio::spawn({
                    let store = store.clone();
                    async move { store.assign_light(b.id, "light.x").await }
                }),
            );
            let wins = [ra.unwrap().is_ok(), rb.unwrap().is_ok()];
            assert_eq!(wins.iter().filter(|w| **w).count(), 1);

            let holders = store
                .list_all()
                .await
                .unwrap()
                .into_iter()
                .filter(|t| t.has_light("light.x"))
                .count();
            assert_eq!(holders, 1);
        }
    }

    #[tokio::test]
    async fn test_patch_keeps_concurrently_assigned_light() {
        let store = InMemoryStore::new();
        let tank = store.insert(Aquarium::new("A")).await.unwrap();

        store.assign_light(tank.id, "light.x").await.unwrap();
        let patched = store
            .patch(
                tank.id,
                AquariumPatch {
                    description: Some("planted".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(patched.has_light("light.x"));
    }

    #[tokio::test]
    async fn test_removing_aquarium_frees_its_lights() {
        let store = InMemoryStore::new();
        let mut tank = Aquarium::new("A");
        tank.attach_lights(["light.x"]);
        let tank = store.insert(tank).await.unwrap();

        assert!(matches!(
            store.remove_light("light.x").await,
            Err(StoreError::LightTaken { .. })
        ));
        store.remove(tank.id).await.unwrap();
        assert!(!store.get_light("light.x").await.unwrap().unwrap().is_assigned());
        store.remove_light("light.x").await.unwrap();
        assert!(store.list_lights().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_light_registry() {
        let store = InMemoryStore::new();
        let created = store
            .create_light(LightEntity::with_data("light.reef", json!({ "state": "off" })))
            .await
            .unwrap();
        assert!(!created.is_assigned());
        assert!(matches!(
            store.create_light(LightEntity::new("light.reef")).await,
            Err(StoreError::LightExists(_))
        ));

        let updated = store
            .update_light("light.reef", json!({ "state": "on" }))
            .await
            .unwrap();
        assert_eq!(updated.entity_data["state"], "on");
        assert!(updated.last_updated >= created.last_updated);

        assert!(matches!(
            store.update_light("light.missing", json!({})).await,
            Err(StoreError::LightNotFound(_))
        ));
    }
}
