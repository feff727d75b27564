use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use mock_service::MockConfig;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mock_service=debug,tower_http=info")),
        )
        .init();

    PrometheusBuilder::new()
        .with_http_listener("0.0.0.0:8002".parse::<SocketAddr>()?)
        .install()
        .context("installing the Prometheus exporter")?;

    let config = MockConfig {
        stock: 10_000,
        max_rps: NonZeroU32::new(2_000),
        ..MockConfig::default()
    };
    let app = mock_service::router(config).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = "0.0.0.0:8080".parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
