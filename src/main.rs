use bambooyard_backend::api::{build_router, AppState};
use bambooyard_backend::config::AppConfig;
use bambooyard_backend::database::store::{DocumentStore, JsonFileStore};
use bambooyard_backend::database::Repositories;
use bambooyard_backend::logging::init_tracing;
use bambooyard_backend::middleware::logging::{request_logging_middleware, UuidRequestId};
use bambooyard_backend::payments::PaymentProviderFactory;
use http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.logging);
    config.validate().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.paytm.environment,
        "Starting Bamboo Yard backend"
    );

    let store: Arc<dyn DocumentStore> = Arc::new(JsonFileStore::new(&config.storage.data_dir));
    store.ping().await.map_err(|e| {
        error!(data_dir = %config.storage.data_dir.display(), error = %e, "Data directory is not usable");
        e
    })?;
    let repos = Repositories::load(store).await?;
    info!(data_dir = %config.storage.data_dir.display(), "Storage initialized");

    let payments = PaymentProviderFactory::from_config(&config.paytm, &config.upi)?;
    info!(providers = ?payments.list_available_providers(), "Payment providers initialized");

    let state = AppState::new(&config.auth, repos, payments)?;

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(axum::middleware::from_fn(request_logging_middleware))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.server.cors_allowed_origins)),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
