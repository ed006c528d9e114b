use agproxy::config::ProxyConfig;
use agproxy::server::{AppState, router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agproxy=info")))
		.init();

	let config = ProxyConfig::from_env();
	let port = config.port;

	let app = router(AppState::new(config));

	let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
	tracing::info!("antigravity-openai-proxy listening on port {port}");
	axum::serve(listener, app).await?;

	Ok(())
}
