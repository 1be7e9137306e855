use axum::{routing::get, Router};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;

mod config;
mod handlers;
mod mailer;
mod middleware;
mod models;
mod rate_limit;
mod routes;
mod session;
mod state;
mod store;

use config::Config;
use mailer::Mailer;
use rate_limit::RateLimiter;
use state::AppState;
use store::Store;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("tester_service=debug")
        .init();

    let config = Config::from_env();

    let store = Store::new(config.supabase_url.clone(), config.supabase_key.clone());
    let mailer = match &config.mailer {
        Some(credentials) => Some(
            Mailer::new(&credentials.user, &credentials.password)
                .expect("SMTP transport setup failed"),
        ),
        None => {
            tracing::warn!("MAILER_USER/MAILER_PASSWORD not set; email sending is disabled");
            None
        }
    };
    let limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_window);

    let port = config.port;
    let state = Arc::new(AppState {
        config,
        store,
        mailer,
        limiter,
    });

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api/v1", routes::routes(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server at {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
