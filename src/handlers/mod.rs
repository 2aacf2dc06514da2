use axum::http::HeaderValue;
use axum::{extract::State, middleware as axum_middleware, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config;
use crate::state::AppState;

pub mod admin;
pub mod employees;
pub mod import;
pub mod locations;
pub mod whoami;

/// Assemble the full application router: public endpoints, then the
/// protected API behind the session and identity middleware.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(whoami::routes())
        .merge(employees::routes())
        .merge(locations::routes())
        .merge(import::routes())
        .merge(admin::routes())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::identity::load_employee_identity,
        ))
        .layer(axum_middleware::from_fn(
            crate::middleware::session::require_principal,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(protected)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    let origins = &config::config().security.cors_origins;
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if parsed.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Alliance Hub",
            "version": version,
            "description": "Internal employee management API",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "whoami": "/api/auth/whoami (protected)",
                "employees": "/api/employees[/:id] (protected)",
                "locations": "/api/locations[/:id] (protected)",
                "import": "/api/import/template/:entity (protected)",
                "admin": "/api/admin/table/:table (restricted, ADMIN only)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::health_check(&state.db).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
