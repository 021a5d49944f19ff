pub mod backend;
pub mod config;
pub mod cookies;
pub mod flash;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;
pub mod vocab;
pub mod workers;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub fn build_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
