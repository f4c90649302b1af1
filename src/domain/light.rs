use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ENTITY_PREFIX: &str = "light.";

/// True for Home Assistant light entity ids such as `light.tank_left`
pub fn is_light_entity_id(entity_id: &str) -> bool {
    entity_id.len() > ENTITY_PREFIX.len() && entity_id.starts_with(ENTITY_PREFIX)
}

/// A known light in the registry, whether or not it is attached to an aquarium
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightEntity {
    pub entity_id: String,
    /// Last reported Home Assistant state and attributes, stored as-is
    #[serde(default)]
    pub entity_data: serde_json::Value,
    pub last_updated: DateTime<Utc>,
    /// Owning aquarium; maintained by the store on assign and unassign
    #[serde(default)]
    pub aquarium_id: Option<Uuid>,
}

impl LightEntity {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self::with_data(entity_id, serde_json::Value::Object(Default::default()))
    }

    pub fn with_data(entity_id: impl Into<String>, entity_data: serde_json::Value) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_data,
            last_updated: Utc::now(),
            aquarium_id: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.aquarium_id.is_some()
    }

    /// Replace the stored entity state and bump `last_updated`
    pub fn refresh(&mut self, entity_data: serde_json::Value) {
        self.entity_data = entity_data;
        self.last_updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_id_prefix() {
        assert!(is_light_entity_id("light.tank_left"));
        assert!(!is_light_entity_id("switch.pump"));
        assert!(!is_light_entity_id("light."));
    }

    #[test]
    fn test_refresh_bumps_timestamp() {
        let mut light = LightEntity::new("light.reef");
        let before = light.last_updated;
        light.refresh(json!({ "state": "on" }));
        assert_eq!(light.entity_data["state"], "on");
        assert!(light.last_updated >= before);
        assert!(!light.is_assigned());
    }
}
