use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::{middleware, Router};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use shop_api::config::{init_tracing, load_config};
use shop_api::db::{establish_connection_from_app_config, run_migrations};
use shop_api::events::{process_events, EventSender};
use shop_api::handlers::AppServices;
use shop_api::request_context::request_path_middleware;
use shop_api::{api_v1_routes, health, openapi, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    init_tracing(config.log_level(), config.log_json);

    info!(
        environment = %config.environment,
        "Starting shop-api v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db = Arc::new(
        establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to the database")?,
    );

    if config.auto_migrate {
        run_migrations(&db).await.context("migrations failed")?;
        info!("Database migrations applied");
    }

    let (tx, rx) = mpsc::channel(1024);
    let event_sender = Arc::new(EventSender::new(tx));
    tokio::spawn(process_events(rx));

    let services = AppServices::new(db.clone(), event_sender.clone());
    let state = AppState {
        db,
        config: Arc::new(config.clone()),
        event_sender,
        services,
    };

    let cors = build_cors_layer(&config);

    let app = Router::new()
        .route("/", axum::routing::get(root))
        .merge(health::routes())
        .merge(openapi::swagger_ui())
        .nest("/api/v1", api_v1_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_path_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn root() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "service": "shop-api",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/docs",
        "health": "/health",
    }))
}

fn build_cors_layer(config: &shop_api::config::AppConfig) -> CorsLayer {
    if let Some(origins) = &config.cors_allowed_origins {
        let parsed: Vec<HeaderValue> = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin {:?}", o);
                    None
                }
            })
            .collect();

        if !parsed.is_empty() {
            return CorsLayer::new()
                .allow_origin(parsed)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers(Any);
        }
    }

    if config.should_allow_permissive_cors() {
        warn!("CORS is wide open; set cors_allowed_origins in production");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .unwrap_or_else(|e| warn!("Failed to listen for ctrl-c: {}", e));
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
