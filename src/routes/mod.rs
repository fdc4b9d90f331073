/// Application routes configuration
use crate::config::Transports;
use crate::handlers::{analyze_get, analyze_post, health, index, lightcurve_form, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

/// Build the application router with the enabled transports
pub fn build_router(state: AppState, transports: Transports, cors_enabled: bool) -> Router {
    let mut router = Router::new()
        // Health check
        .route("/health", get(health));

    // JSON API
    if transports.json {
        let mut api = Router::new().route("/api/:tic_id", get(analyze_get).post(analyze_post));
        if cors_enabled {
            api = api.layer(CorsLayer::permissive());
        }
        router = router.merge(api);
    }

    // Browser form
    if transports.html {
        router = router
            .route("/", get(index))
            .route("/lightcurve", post(lightcurve_form));
    }

    router.with_state(state)
}
