//! API server entry point: wires the Redis saga store and RabbitMQ message
//! bus, starts the reply-queue consumer alongside the HTTP ingress server,
//! and shuts both down gracefully together.

use std::sync::Arc;
use std::time::Duration;

use api::auth::HttpTokenValidator;
use api::config::Config;
use api::routes::orders::AppState;
use bus::rabbitmq::RabbitMqBus;
use saga::SagaCoordinator;
use store::redis_store::RedisSagaStore;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT, starting graceful shutdown"),
        () = terminate => tracing::info!("received SIGTERM, starting graceful shutdown"),
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(?config, "loaded configuration");

    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder.install_recorder().expect("failed to install Prometheus recorder");

    let store = Arc::new(RedisSagaStore::open(&config.redis_url()).expect("failed to connect to redis"));
    let bus = Arc::new(RabbitMqBus::connect(&config.amqp_url()).expect("failed to connect to rabbitmq"));
    let coordinator = Arc::new(SagaCoordinator::new(store, bus));

    let token_validator = Arc::new(HttpTokenValidator::new(config.auth_base_url(), config.auth_timeout()));
    let state = Arc::new(AppState {
        coordinator: coordinator.clone(),
        token_validator,
    });

    let consumer_shutdown = CancellationToken::new();
    let consumer_coordinator = coordinator.clone();
    let consumer_cancel = consumer_shutdown.clone();
    let consumer_task = tokio::spawn(async move {
        if let Err(e) = consumer_coordinator.run(consumer_cancel).await {
            tracing::error!(error = %e, "saga consumer exited with an error");
        }
    });

    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");
    let listener = tokio::net::TcpListener::bind(&addr).await.expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    consumer_shutdown.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), consumer_task).await;

    tracing::info!("server shut down gracefully");
}
