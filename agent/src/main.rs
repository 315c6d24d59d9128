mod collection;
mod config;
mod error;
mod orchestrator;
mod sender;

use std::sync::Arc;

use config::{Config, Transport};
use envconfig::Envconfig;
use error::AgentError;
use orchestrator::Orchestrator;
use sender::{GrpcSender, HttpSender, RateLimiter, Sender};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        tracing::error!(%error, "agent exited with a startup failure");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AgentError> {
    let config = Config::init_from_env().expect("invalid agent configuration");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let public_key = if config.crypto_key.is_empty() {
        tracing::warn!("no RSA public key configured, metrics will be sent unencrypted");
        None
    } else {
        Some(crypto::load_public_key(&config.crypto_key)?)
    };

    let rate_limiter = RateLimiter::new(config.rate_tokens_count);
    let cancel = CancellationToken::new();

    let sender: Arc<dyn Sender> = match config.transport {
        Transport::Http => Arc::new(HttpSender::new(
            format!("http://{}", config.address),
            config.client_timeout.0,
            config.report_timeout.0,
            public_key,
            rate_limiter,
        )?),
        Transport::Grpc => Arc::new(
            GrpcSender::connect(
                &format!("http://{}", config.address),
                config.report_timeout.0,
                rate_limiter,
            )
            .await?,
        ),
    };

    let orchestrator = Orchestrator::new(sender, config.hmac_key.clone().into_bytes(), cancel.clone());

    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received shutdown signal, draining in-flight ticks");
        shutdown_cancel.cancel();
    });

    orchestrator
        .run(config.poll_interval.0, config.report_interval.0)
        .await;

    tracing::info!("agent shut down cleanly");
    Ok(())
}
