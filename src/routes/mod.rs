//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/jobs` - job listing and CRUD
//! - `/api/jobs/stats` - dashboard statistics
//! - `/api/health` - health checks

pub mod health;
pub mod jobs;

use axum::Router;
use tower_http::trace::TraceLayer;
use crate::middleware::apply_cors;
use crate::models::AppState;
use tracing::info;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let router = Router::new()
        .merge(jobs::router(state.clone()))
        .merge(health::router(state))
        .layer(TraceLayer::new_for_http());

    apply_cors(router)
}
