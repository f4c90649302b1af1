pub mod aquariums;
pub mod error;
pub mod lights;
pub mod sun;
pub mod v1;
pub mod ws;

use axum::{http::HeaderValue, routing::get, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::warn;

use crate::{config::Config, controller::AppState};

pub fn router(state: AppState, cfg: &Config) -> Router {
    let mut router = Router::new()
        .route("/ws", get(ws::sun_socket))
        .with_state(state.clone())
        .nest("/api/v1", v1::router(state));

    if cfg.server.enable_cors {
        match cfg.server.cors_origin.parse::<HeaderValue>() {
            Ok(origin) => {
                use tower_http::cors::AllowOrigin;
                let cors = CorsLayer::new()
                    .allow_origin(AllowOrigin::exact(origin))
                    .allow_methods([
                        axum::http::Method::GET,
                        axum::http::Method::POST,
                        axum::http::Method::PUT,
                        axum::http::Method::DELETE,
                    ])
                    .allow_headers([axum::http::header::CONTENT_TYPE]);
                router = router.layer(cors);
            }
            Err(e) => warn!(origin = %cfg.server.cors_origin, error = %e, "invalid CORS origin, CORS disabled"),
        }
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
                .layer(TimeoutLayer::new(Duration::from_secs(cfg.server.request_timeout_secs))),
        )
        .layer(TraceLayer::new_for_http())
}
