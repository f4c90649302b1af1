use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::{
    api::{aquariums, lights, sun},
    controller::{AppState, TaskStatus},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/scheduler/status", get(scheduler_status))
        .route("/suns", get(sun::get_distribution))
        .route("/suns/latest", get(sun::get_latest))
        .route("/suns/distribution", post(sun::post_distribution))
        .route("/suns/simulate", post(sun::simulate))
        .route("/aquariums", get(aquariums::list).post(aquariums::create))
        .route(
            "/aquariums/:id",
            get(aquariums::get_one)
                .put(aquariums::update)
                .delete(aquariums::remove),
        )
        .route("/aquariums/:id/simulation", get(aquariums::simulation))
        .route("/aquariums/:id/distribution", get(aquariums::distribution))
        .route("/aquariums/:id/lights", post(aquariums::assign_light))
        .route(
            "/aquariums/:id/lights/:entity_id",
            axum::routing::delete(aquariums::unassign_light),
        )
        .route("/lights", get(lights::list).post(lights::create))
        .route(
            "/lights/:entity_id",
            get(lights::get_one)
                .put(lights::update)
                .delete(lights::remove),
        )
        .with_state(state)
}

pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct SchedulerStatus {
    pub tick: TaskStatus,
    pub live_subscribers: usize,
}

pub async fn scheduler_status(State(st): State<AppState>) -> Json<SchedulerStatus> {
    Json(SchedulerStatus {
        tick: st.scheduler.status(),
        live_subscribers: st.live.subscriber_count(),
    })
}
