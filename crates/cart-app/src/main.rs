use cart_hex::config::Config;
use cart_hex::inbound::http::{HttpServer, HttpServerConfig};
use cart_repo::build_backend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for SERVER_PORT when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    let backend = build_backend();
    tracing::info!(port = %config.server_port, "serving in-memory cart backend");

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
    };

    let http = HttpServer::new(backend, server_cfg).await?;
    http.run().await
}
