mod config;
mod controller;
mod error;
mod grpc;
mod http;
mod metrics;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use config::{Config, RepositoryBackend};
use controller::Controller;
use envconfig::Envconfig;
use error::CollectorError;
use health::HealthRegistry;
use metrics_proto::metrics_collector_server::MetricsCollectorServer;
use repository::{BackupRepository, RelationalRepository, Repository};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        tracing::error!(%error, "collector exited with a startup failure");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CollectorError> {
    let config = Config::init_from_env().expect("invalid collector configuration");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let private_key = if config.crypto_key.is_empty() {
        tracing::warn!("no RSA private key configured, plaintext request bodies are accepted");
        None
    } else {
        Some(Arc::new(crypto::load_private_key(&config.crypto_key)?))
    };

    let liveness = HealthRegistry::new("liveness");

    let repository: Arc<dyn Repository> = match config.backend() {
        RepositoryBackend::Memory => {
            let backup = Arc::new(BackupRepository::new(
                &config.store_file,
                config.store_interval.0,
                config.restore,
            ));
            backup.start();
            backup
        }
        RepositoryBackend::Relational => {
            let relational = RelationalRepository::connect(&config.database_dsn, 10).await?;
            Arc::new(relational)
        }
    };

    let controller = Arc::new(Controller::new(repository.clone(), config.hmac_key.clone().into_bytes()));

    let trusted_subnet = config.trusted_subnet;
    let state = http::AppState {
        controller: controller.clone(),
        private_key: private_key.clone(),
        trusted_subnet,
    };
    let app = http::router(state, true).merge(liveness_router(liveness.clone()));

    let cancel = CancellationToken::new();
    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received shutdown signal, stopping servers");
        shutdown_cancel.cancel();
    });

    let http_liveness = liveness
        .register("http".to_owned(), time::Duration::seconds(60))
        .await;
    let grpc_liveness = liveness
        .register("grpc".to_owned(), time::Duration::seconds(60))
        .await;

    let http_listener = tokio::net::TcpListener::bind(&config.address)
        .await
        .unwrap_or_else(|e| panic!("failed to bind HTTP address {}: {e}", config.address));
    let http_cancel = cancel.clone();
    let http_server = tokio::spawn(async move {
        http_liveness.report_healthy().await;
        let result = axum::serve(http_listener, app)
            .with_graceful_shutdown(async move { http_cancel.cancelled().await })
            .await;
        if let Err(error) = result {
            tracing::error!(%error, "http server exited with an error");
        }
    });

    let grpc_addr: std::net::SocketAddr = config
        .grpc_address
        .parse()
        .unwrap_or_else(|e| panic!("invalid GRPC_ADDRESS {}: {e}", config.grpc_address));
    let grpc_service = grpc::GrpcCollector::new(controller.clone());
    let grpc_cancel = cancel.clone();
    let grpc_server = tokio::spawn(async move {
        grpc_liveness.report_healthy().await;
        let result = tonic::transport::Server::builder()
            .add_service(MetricsCollectorServer::new(grpc_service))
            .serve_with_shutdown(grpc_addr, async move { grpc_cancel.cancelled().await })
            .await;
        if let Err(error) = result {
            tracing::error!(%error, "grpc server exited with an error");
        }
    });

    let _ = tokio::join!(http_server, grpc_server);

    tracing::info!("servers stopped, shutting down repository");
    repository.shutdown().await?;

    tracing::info!("collector shut down cleanly");
    Ok(())
}

/// `/_liveness` reports the combined health of the HTTP and gRPC servers,
/// matching the shape other services in the stack expose for k8s probes.
fn liveness_router(registry: HealthRegistry) -> Router {
    Router::new().route("/_liveness", get(move || std::future::ready(registry.get_status())))
}
