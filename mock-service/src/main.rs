use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_env_filter("mock_service=info,tower_http=debug")
        .init();

    PrometheusBuilder::new()
        .with_http_listener("0.0.0.0:8002".parse::<SocketAddr>()?)
        .install()?;

    tokio::spawn(mock_service::rps_measure_task());

    let addr: SocketAddr = "0.0.0.0:11434".parse()?;
    mock_service::run(addr).await;
    Ok(())
}
