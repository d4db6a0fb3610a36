//! letterd — collaborative letter editing server.
//!
//! WebSocket relay + room registry + Postgres checkpointing.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use base64::Engine;
use ed25519_dalek::SigningKey;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use letterd::auth::IdentityVerifier;
use letterd::config::Config;
use letterd::state::AppState;
use letterd::store::{PgDraftStore, PgRoomStore};
use letterd::{api, ws};

#[tokio::main]
async fn main() {
    // Load .env if present (local dev).
    let _ = dotenvy::dotenv();

    let config = Config::from_env();

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(true)
        .init();

    info!("letterd starting");
    info!(listen = %config.listen_addr, origin = %config.frontend_origin);

    // ── Postgres ────────────────────────────────────────────
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to Postgres");

    info!("running migrations");
    letterd::store::MIGRATOR
        .run(&pool)
        .await
        .expect("migration failed");

    info!("database ready");

    // ── Identity verification key ───────────────────────────
    let verifier = match &config.auth_public_key {
        Some(encoded) => IdentityVerifier::from_base64(encoded).expect("invalid AUTH_PUBLIC_KEY"),
        None => {
            // Local dev: fresh keypair per startup. Tokens must be minted
            // with the logged signing key; production sets AUTH_PUBLIC_KEY.
            let signing = SigningKey::generate(&mut rand::thread_rng());
            let engine = base64::engine::general_purpose::STANDARD;
            warn!(
                public_key = %engine.encode(signing.verifying_key().to_bytes()),
                signing_key = %engine.encode(signing.to_bytes()),
                "AUTH_PUBLIC_KEY unset — generated ephemeral dev keypair"
            );
            IdentityVerifier::new(signing.verifying_key())
        }
    };

    // ── Shared state ────────────────────────────────────────
    let rooms = Arc::new(PgRoomStore::new(pool.clone()));
    let drafts = Arc::new(PgDraftStore::new(pool));
    let state = AppState::new(rooms, drafts, verifier, config.clone());

    // ── Routes ──────────────────────────────────────────────
    let cors = CorsLayer::new()
        .allow_origin(
            config
                .frontend_origin
                .parse::<HeaderValue>()
                .expect("invalid FRONTEND_ORIGIN"),
        )
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let app = Router::new()
        // WebSocket endpoint.
        .route("/ws", get(ws::ws_handler))
        // Health check (useful for K8s liveness probes).
        .route("/healthz", get(healthz))
        // Draft trigger routes.
        .merge(api::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // ── Bind & serve ────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind");

    info!(addr = %config.listen_addr, "letterd listening");

    axum::serve(listener, app)
        .await
        .expect("server error");
}

/// Liveness probe.
async fn healthz() -> &'static str {
    "ok"
}
