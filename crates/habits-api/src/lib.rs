pub mod auth;
pub mod errors;
pub mod habits;
pub mod middleware;
pub mod users;
pub mod validation;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::auth::AppState;
use crate::middleware::require_auth;

/// All API routes. Transport layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/users/me", get(users::get_profile).patch(users::update_profile))
        .route("/habits", get(habits::list_habits).post(habits::create_habit))
        .route("/habits/public", get(habits::list_public_habits))
        .route(
            "/habits/{habit_id}",
            get(habits::get_habit)
                .patch(habits::update_habit)
                .delete(habits::delete_habit),
        )
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
