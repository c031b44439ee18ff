use axum::{
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::SchoolStore;
use crate::handlers::{protected::grades, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::{GradeService, GradeServiceConfig};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub grades: GradeService,
}

impl AppState {
    pub fn new(store: Arc<dyn SchoolStore>, config: GradeServiceConfig) -> Self {
        Self {
            grades: GradeService::new(store, config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected API
        .merge(grade_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn grade_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/grades",
            get(grades::grade_list).post(grades::grade_register),
        )
        .route(
            "/api/grades/:id",
            get(grades::grade_get)
                .put(grades::grade_edit)
                .delete(grades::grade_deactivate),
        )
        .route(
            "/api/grades/student/:student/:cycle",
            get(grades::grade_student_summary),
        )
        .route(
            "/api/grades/roster/:course/:subject/:period",
            get(grades::grade_roster),
        )
        .route(
            "/api/grades/transcript/:student/:cycle",
            get(grades::grade_transcript),
        )
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}
