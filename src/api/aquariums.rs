use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::error::ApiError,
    controller::AppState,
    domain::{is_light_entity_id, Aquarium, AquariumPatch, LightingConfigPatch},
    simulation::{DistributionPoint, SimulationResult},
};

/// Request to create an aquarium
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAquariumRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub gallons: Option<f64>,
    pub dimensions: Option<String>,
    pub lighting_config: Option<LightingConfigPatch>,
    #[serde(default)]
    pub lights: Vec<String>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAquariumRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub gallons: Option<f64>,
    pub dimensions: Option<String>,
    pub lighting_config: Option<LightingConfigPatch>,
}

#[derive(Debug, Deserialize)]
pub struct AssignLightRequest {
    pub entity_id: String,
}

impl From<UpdateAquariumRequest> for AquariumPatch {
    fn from(req: UpdateAquariumRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            gallons: req.gallons,
            dimensions: req.dimensions,
            lighting_config: req.lighting_config,
        }
    }
}

async fn load(st: &AppState, id: Uuid) -> Result<Aquarium, ApiError> {
    st.repos
        .aquariums
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Aquarium {id}")))
}

pub(crate) fn check_entity_id(entity_id: &str) -> Result<(), ApiError> {
    if is_light_entity_id(entity_id) {
        Ok(())
    } else {
        Err(ApiError::ValidationError(format!(
            "{entity_id:?} is not a light entity id"
        )))
    }
}

/// GET /api/v1/aquariums
pub async fn list(State(st): State<AppState>) -> Result<Json<Vec<Aquarium>>, ApiError> {
    Ok(Json(st.repos.aquariums.list_all().await?))
}

/// GET /api/v1/aquariums/:id
pub async fn get_one(
    State(st): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Aquarium>, ApiError> {
    Ok(Json(load(&st, id).await?))
}

/// POST /api/v1/aquariums - repeated light ids are collapsed
pub async fn create(
    State(st): State<AppState>,
    Json(req): Json<CreateAquariumRequest>,
) -> Result<(StatusCode, Json<Aquarium>), ApiError> {
    req.validate()?;
    if let Some(patch) = &req.lighting_config {
        st.scheduler.resolve(Some(patch))?;
    }
    for entity_id in &req.lights {
        check_entity_id(entity_id)?;
    }

    let mut aquarium = Aquarium::new(req.name);
    aquarium.description = req.description;
    aquarium.gallons = req.gallons;
    aquarium.dimensions = req.dimensions;
    aquarium.lighting_config = req.lighting_config;
    aquarium.attach_lights(req.lights);

    let created = st.repos.aquariums.insert(aquarium).await?;
    info!(aquarium_id = %created.id, name = %created.name, "aquarium created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/aquariums/:id - pushes new light states when the lighting config changes
pub async fn update(
    State(st): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAquariumRequest>,
) -> Result<Json<Aquarium>, ApiError> {
    req.validate()?;
    if let Some(patch) = &req.lighting_config {
        st.scheduler.resolve(Some(patch))?;
    }
    let lighting_changed = req.lighting_config.is_some();

    let updated = st.repos.aquariums.patch(id, req.into()).await?;

    if lighting_changed {
        if let Err(e) = st.scheduler.recompute_and_publish(id).await {
            warn!(aquarium_id = %id, error = %e, "config saved but immediate light push failed");
        }
    }

    Ok(Json(updated))
}

/// DELETE /api/v1/aquariums/:id
pub async fn remove(
    State(st): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if st.repos.aquariums.remove(id).await? {
        info!(aquarium_id = %id, "aquarium removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Aquarium {id}")))
    }
}

/// GET /api/v1/aquariums/:id/simulation - current state under the aquarium's own config
pub async fn simulation(
    State(st): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SimulationResult>, ApiError> {
    Ok(Json(st.scheduler.aquarium_simulation(id).await?))
}

/// GET /api/v1/aquariums/:id/distribution
pub async fn distribution(
    State(st): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DistributionPoint>>, ApiError> {
    let aquarium = load(&st, id).await?;
    Ok(Json(st.scheduler.distribution(aquarium.lighting_config.as_ref())?))
}

/// POST /api/v1/aquariums/:id/lights - unknown lights are added to the registry
pub async fn assign_light(
    State(st): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignLightRequest>,
) -> Result<Json<Aquarium>, ApiError> {
    check_entity_id(&req.entity_id)?;
    let updated = st.repos.aquariums.assign_light(id, &req.entity_id).await?;
    info!(aquarium_id = %id, entity_id = %req.entity_id, "light assigned");
    Ok(Json(updated))
}

/// DELETE /api/v1/aquariums/:id/lights/:entity_id
pub async fn unassign_light(
    State(st): State<AppState>,
    Path((id, entity_id)): Path<(Uuid, String)>,
) -> Result<Json<Aquarium>, ApiError> {
    let updated = st.repos.aquariums.unassign_light(id, &entity_id).await?;
    info!(aquarium_id = %id, entity_id = %entity_id, "light unassigned");
    Ok(Json(updated))
}
