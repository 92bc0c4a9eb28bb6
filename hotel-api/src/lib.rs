use axum::{
    http::Method,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod availability;
pub mod dashboard;
pub mod error;
pub mod middleware;
pub mod reservations;
pub mod rooms;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let require_admin = axum::middleware::from_fn_with_state(state.clone(), middleware::admin_auth_middleware);

    let admin = Router::new()
        .route("/admin/dashboard", get(dashboard::get_dashboard))
        .route("/admin/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route("/admin/rooms/{id}", get(rooms::get_room).put(rooms::update_room))
        .route(
            "/admin/reservations",
            get(reservations::list_reservations).post(reservations::create_admin_reservation),
        )
        .route("/admin/reservations/{id}", get(reservations::get_reservation))
        .route("/admin/reservations/{id}/status", patch(reservations::change_status))
        .route_layer(require_admin.clone());

    let public = Router::new()
        .route("/health", get(health))
        .route("/availability", get(availability::check_availability))
        .route("/rooms", get(availability::list_rooms))
        .route(
            "/rooms/{id}",
            get(availability::get_room).merge(delete(rooms::delete_room).route_layer(require_admin.clone())),
        )
        .route("/rooms/{id}/alternatives", get(availability::alternatives))
        .route("/reservations", post(reservations::create_reservation))
        .route(
            "/reservations/{id}",
            delete(reservations::delete_reservation).route_layer(require_admin),
        )
        .merge(auth::routes());

    Router::new()
        .merge(public)
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
