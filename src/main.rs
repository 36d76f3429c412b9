mod access;
mod auth;
mod catalog;
mod config;
mod credentials;
mod db;
mod entities;
mod error;
mod models;
mod ratings;
mod registry;
mod routes;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::{Argon2Hasher, JwtIssuer, TokenIssuer},
    catalog::MovieCatalog,
    config::Config,
    credentials::CredentialStore,
    ratings::RatingLedger,
    registry::FileRegistry,
};

#[derive(Clone)]
pub struct AppState {
    pub db: sea_orm::DatabaseConnection,
    pub credentials: CredentialStore,
    pub catalog: MovieCatalog,
    pub ledger: RatingLedger,
    pub registry: FileRegistry,
    pub tokens: Arc<dyn TokenIssuer>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,reelrate=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let tokens: Arc<dyn TokenIssuer> =
        Arc::new(JwtIssuer::new(config.jwt_secret.clone(), config.token_ttl_hours));

    let state = Arc::new(AppState {
        db: db.clone(),
        credentials: CredentialStore::new(db.clone(), Arc::new(Argon2Hasher)),
        catalog: MovieCatalog::new(db.clone()),
        ledger: RatingLedger::new(db.clone()),
        registry: FileRegistry::new(db, config.upload_dir.clone()),
        tokens,
    });

    let app = Router::new()
        .route("/routes", get(routes::list_routes))
        .route("/test_db_connection", get(routes::test_db_connection))
        .route("/register", post(routes::register))
        .route("/login", post(routes::login))
        .route("/movies", get(routes::list_movies))
        .route("/movies/{id}", get(routes::movie_details))
        .route("/add_movie", post(routes::add_movie))
        .route("/submit_rating", post(routes::submit_rating))
        .route("/ratings", get(routes::list_ratings))
        .route("/ratings/{id}", put(routes::update_rating).delete(routes::delete_rating))
        .route("/upload", post(routes::upload))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
