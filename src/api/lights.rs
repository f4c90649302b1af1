use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    api::{aquariums::check_entity_id, error::ApiError},
    controller::AppState,
    domain::LightEntity,
};

#[derive(Debug, Default, Deserialize)]
pub struct LightListQuery {
    /// Only lights not attached to any aquarium
    #[serde(default)]
    pub unassigned: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateLightRequest {
    pub entity_id: String,
    #[serde(default)]
    pub entity_data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLightRequest {
    pub entity_data: serde_json::Value,
}

/// GET /api/v1/lights
pub async fn list(
    State(st): State<AppState>,
    Query(query): Query<LightListQuery>,
) -> Result<Json<Vec<LightEntity>>, ApiError> {
    let mut lights = st.repos.lights.list_lights().await?;
    if query.unassigned {
        lights.retain(|l| !l.is_assigned());
    }
    Ok(Json(lights))
}

/// GET /api/v1/lights/:entity_id
pub async fn get_one(
    State(st): State<AppState>,
    Path(entity_id): Path<String>,
) -> Result<Json<LightEntity>, ApiError> {
    st.repos
        .lights
        .get_light(&entity_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Light {entity_id}")))
}

/// POST /api/v1/lights
pub async fn create(
    State(st): State<AppState>,
    Json(req): Json<CreateLightRequest>,
) -> Result<(StatusCode, Json<LightEntity>), ApiError> {
    check_entity_id(&req.entity_id)?;
    let light = match req.entity_data {
        Some(data) => LightEntity::with_data(req.entity_id, data),
        None => LightEntity::new(req.entity_id),
    };
    let created = st.repos.lights.create_light(light).await?;
    info!(entity_id = %created.entity_id, "light registered");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/lights/:entity_id - replace the stored entity state
pub async fn update(
    State(st): State<AppState>,
    Path(entity_id): Path<String>,
    Json(req): Json<UpdateLightRequest>,
) -> Result<Json<LightEntity>, ApiError> {
    Ok(Json(
        st.repos
            .lights
            .update_light(&entity_id, req.entity_data)
            .await?,
    ))
}

/// DELETE /api/v1/lights/:entity_id - assigned lights must be unassigned first
pub async fn remove(
    State(st): State<AppState>,
    Path(entity_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    st.repos.lights.remove_light(&entity_id).await?;
    info!(entity_id = %entity_id, "light removed from registry");
    Ok(StatusCode::NO_CONTENT)
}
