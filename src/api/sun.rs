use axum::{extract::State, Json};
use chrono::NaiveTime;
use serde::Deserialize;

use crate::{
    api::error::ApiError,
    controller::AppState,
    domain::LightingConfigPatch,
    simulation::{DistributionPoint, SimulationResult},
};

/// GET /api/v1/suns - Distribution table for the default config
pub async fn get_distribution(
    State(st): State<AppState>,
) -> Result<Json<Vec<DistributionPoint>>, ApiError> {
    Ok(Json(st.scheduler.distribution(None)?))
}

/// POST /api/v1/suns/distribution - Distribution table for a draft config
pub async fn post_distribution(
    State(st): State<AppState>,
    Json(patch): Json<LightingConfigPatch>,
) -> Result<Json<Vec<DistributionPoint>>, ApiError> {
    Ok(Json(st.scheduler.distribution(Some(&patch))?))
}

/// GET /api/v1/suns/latest - Last scheduled result, `null` before the first tick
pub async fn get_latest(State(st): State<AppState>) -> Json<Option<SimulationResult>> {
    Json(st.scheduler.latest())
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    /// `HH:MM` or `HH:MM:SS`; defaults to the current local time
    pub time: Option<String>,
    pub config: Option<LightingConfigPatch>,
}

/// POST /api/v1/suns/simulate - Evaluate the curve for any time and config
pub async fn simulate(
    State(st): State<AppState>,
    Json(req): Json<SimulateRequest>,
) -> Result<Json<SimulationResult>, ApiError> {
    let time = match req.time.as_deref() {
        Some(raw) => parse_clock(raw)?,
        None => st.scheduler.local_now(),
    };
    let config = st.scheduler.resolve(req.config.as_ref())?;
    Ok(Json(st.scheduler.simulate_for(time, &config)?))
}

fn parse_clock(raw: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| ApiError::BadRequest(format!("invalid time {raw:?}, expected HH:MM[:SS]")))
}
