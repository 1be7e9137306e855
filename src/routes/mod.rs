use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::middleware::require_admin;
use crate::state::AppState;

pub fn routes(state: Arc<AppState>) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/register", post(register))
        .route("/email", post(send_confirmation_email))
        .route("/cron/keep-alive", get(keep_alive))
        .route("/admin/auth", post(admin_auth))
        .route("/admin/logout", post(admin_logout));

    // Admin routes (require the admin session cookie)
    let admin_routes = Router::new()
        .route("/admin/verify", get(admin_verify))
        .route("/admin/testers", get(list_testers).delete(delete_testers))
        .route("/admin/invite", post(invite_testers))
        .route("/admin/invite-android", post(invite_android))
        .route_layer(middleware::from_fn(require_admin));

    // Combine routes
    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}
