//! Thin HTTP adapter: parses requests, runs the orchestration, serializes
//! results. All translation/streaming logic lives in the other modules.

// region:    --- Modules

mod catalog;
mod handlers;
mod sse;

pub use catalog::*;
pub use handlers::*;
pub use sse::*;

// endregion: --- Modules

use crate::auth::TokenCache;
use crate::config::ProxyConfig;
use crate::webc::UpstreamClient;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::Instant;

// region:    --- AppState

#[derive(Clone)]
pub struct AppState {
	pub config: ProxyConfig,
	pub cache: TokenCache,
	pub upstream: Arc<UpstreamClient>,
	pub started_at: Instant,
}

impl AppState {
	pub fn new(config: ProxyConfig) -> Self {
		let cache = TokenCache::new(&config);
		let upstream = Arc::new(UpstreamClient::new());
		Self::with_parts(config, cache, upstream)
	}

	/// Constructor with injected collaborators (tests swap in mock-backed ones).
	pub fn with_parts(config: ProxyConfig, cache: TokenCache, upstream: Arc<UpstreamClient>) -> Self {
		Self {
			config,
			cache,
			upstream,
			started_at: Instant::now(),
		}
	}
}

// endregion: --- AppState

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(health))
		.route("/metrics", get(metrics))
		.route("/models", get(models))
		.route("/v1/models", get(models))
		.route("/chat/completions", post(chat_completions))
		.route("/v1/chat/completions", post(chat_completions))
		.with_state(state)
}
