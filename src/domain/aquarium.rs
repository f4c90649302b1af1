use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::lighting::LightingConfigPatch;
use crate::simulation::{Rgbw, SimulationResult};

/// A smart light attached to an aquarium, addressed by its Home Assistant entity id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    pub entity_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aquarium {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallons: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting_config: Option<LightingConfigPatch>,
    #[serde(default)]
    pub lights: Vec<Light>,
}

impl Aquarium {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            gallons: None,
            dimensions: None,
            lighting_config: None,
            lights: Vec::new(),
        }
    }

    /// Attach lights in order, skipping entity ids already present
    pub fn attach_lights<I, S>(&mut self, entity_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: HashSet<String> = self.lights.iter().map(|l| l.entity_id.clone()).collect();
        for entity_id in entity_ids {
            let entity_id = entity_id.into();
            if seen.insert(entity_id.clone()) {
                self.lights.push(Light { entity_id });
            }
        }
    }

    pub fn has_light(&self, entity_id: &str) -> bool {
        self.lights.iter().any(|l| l.entity_id == entity_id)
    }

    /// One device command per attached light, all carrying the same simulated state
    pub fn light_commands(&self, sim: &SimulationResult) -> Vec<LightCommand> {
        self.lights
            .iter()
            .map(|light| LightCommand::new(&light.entity_id, sim))
            .collect()
    }
}

/// Field-level edit applied by the store under its own lock
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AquariumPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub gallons: Option<f64>,
    pub dimensions: Option<String>,
    pub lighting_config: Option<LightingConfigPatch>,
}

impl AquariumPatch {
    /// Overwrite the fields that are set; lights are never touched
    pub fn apply(self, aquarium: &mut Aquarium) {
        if let Some(name) = self.name {
            aquarium.name = name;
        }
        if let Some(description) = self.description {
            aquarium.description = Some(description);
        }
        if let Some(gallons) = self.gallons {
            aquarium.gallons = Some(gallons);
        }
        if let Some(dimensions) = self.dimensions {
            aquarium.dimensions = Some(dimensions);
        }
        if let Some(config) = self.lighting_config {
            aquarium.lighting_config = Some(config);
        }
    }
}

/// Target state for a single light
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightCommand {
    pub entity_id: String,
    pub on: bool,
    pub brightness: u8,
    pub rgbw: Rgbw,
}

impl LightCommand {
    pub fn new(entity_id: &str, sim: &SimulationResult) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            on: sim.is_on,
            brightness: sim.brightness_percent,
            rgbw: sim.rgbw,
        }
    }
}

/// Consolidated message published to the light topic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightCommandBatch {
    pub lights: Vec<LightCommand>,
}

impl LightCommandBatch {
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LightingConfig;
    use crate::simulation::simulate;
    use chrono::NaiveTime;

    #[test]
    fn test_attach_lights_skips_repeats() {
        let mut tank = Aquarium::new("Planted");
        tank.attach_lights(["light.a", "light.b", "light.a"]);
        tank.attach_lights(["light.b", "light.c"]);
        let ids: Vec<_> = tank.lights.iter().map(|l| l.entity_id.as_str()).collect();
        assert_eq!(ids, ["light.a", "light.b", "light.c"]);

        let sim = simulate(NaiveTime::from_hms_opt(12, 0, 0).unwrap(), &LightingConfig::default());
        assert_eq!(tank.light_commands(&sim).len(), 3);
    }

    #[test]
    fn test_patch_leaves_lights_alone() {
        let mut tank = Aquarium::new("Reef");
        tank.attach_lights(["light.reef"]);
        AquariumPatch {
            name: Some("Reef 40".into()),
            gallons: Some(40.0),
            ..Default::default()
        }
        .apply(&mut tank);
        assert_eq!(tank.name, "Reef 40");
        assert_eq!(tank.gallons, Some(40.0));
        assert!(tank.description.is_none());
        assert!(tank.has_light("light.reef"));
    }
}
