use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;

use ripple_api::{
    config::Config,
    db, handlers, logging, openapi,
    security::jwt,
    services::MediaStorage,
    state::AppState,
    websocket::{session, ConnectionRegistry},
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = Arc::new(Config::from_env().context("Failed to load configuration")?);
    tracing::info!("Starting ripple-api v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    jwt::initialize(&config.jwt.secret, config.jwt.expiry_secs)
        .context("Failed to initialize JWT signing")?;
    tracing::info!("JWT signing initialized");

    let database = db::connect(&config.database)
        .await
        .context("Failed to connect to MongoDB")?;
    db::ensure_indexes(&database)
        .await
        .context("Failed to create database indexes")?;
    tracing::info!(database = %config.database.name, "MongoDB connected");

    let storage = Arc::new(
        MediaStorage::from_config(&config.storage)
            .await
            .context("Failed to initialize media storage")?,
    );
    let registry = ConnectionRegistry::new();

    let state = AppState {
        db: database,
        registry,
        config: config.clone(),
        storage,
    };

    let bind_addr = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!(%bind_addr, "starting HTTP server");

    let cors_origins = config.cors.allowed_origins.clone();
    HttpServer::new(move || {
        let cors = if cors_origins == "*" {
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600)
        } else {
            let mut cors = Cors::default()
                .allow_any_method()
                .allow_any_header()
                .supports_credentials()
                .max_age(3600);
            for origin in cors_origins.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                cors = cors.allowed_origin(origin);
            }
            cors
        };

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/api/health", web::get().to(|| async { "OK" }))
            .route("/api-docs/openapi.json", web::get().to(openapi::serve))
            .service(session::ws_handler)
            .configure(|cfg| {
                handlers::auth::register_routes(cfg);
                handlers::users::register_routes(cfg);
                handlers::posts::register_routes(cfg);
                handlers::conversations::register_routes(cfg);
                handlers::notifications::register_routes(cfg);
                handlers::media::register_routes(cfg);
            })
    })
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {bind_addr}"))?
    .run()
    .await
    .context("HTTP server failed")
}
