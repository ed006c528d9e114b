//! Per-refresh-token access-token cache.
//!
//! Process-scoped shared state: TTL expiry with a one-minute safety margin,
//! LRU bound, periodic cleanup sweep, and single-flight refresh so that
//! concurrent requests presenting the same refresh token trigger exactly one
//! outbound token exchange.

use crate::auth::{Error, Fingerprint, Result, derive_fingerprint};
use crate::config::ProxyConfig;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const EXPIRY_SAFETY_MARGIN_MS: u64 = 60_000;
const MAX_ENTRIES: usize = 1000;
const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

// region:    --- Types

#[derive(Debug, Clone)]
struct CredentialEntry {
	access_token: String,
	/// Absolute unix-ms expiry (refresh margin already applied).
	expires_at: u64,
	project_id: Option<String>,
	last_accessed_at: u64,
}

#[derive(Debug, Clone)]
struct RefreshedToken {
	access_token: String,
	expires_at: u64,
}

type SharedRefresh = Shared<BoxFuture<'static, Result<RefreshedToken>>>;

#[derive(Default)]
struct CacheInner {
	entries: HashMap<String, CredentialEntry>,
	fingerprints: HashMap<String, Fingerprint>,
	inflight: HashMap<String, SharedRefresh>,
}

#[derive(Debug, Default)]
struct MetricCounters {
	hits: AtomicU64,
	misses: AtomicU64,
	refreshes: AtomicU64,
	evicted_by_cleanup: AtomicU64,
	evicted_by_lru: AtomicU64,
}

/// Snapshot of the cache counters (shape of the `/metrics` payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
	pub hits: u64,
	pub misses: u64,
	pub refreshes: u64,
	#[serde(rename = "evictedByCleanup")]
	pub evicted_by_cleanup: u64,
	#[serde(rename = "evictedByLRU")]
	pub evicted_by_lru: u64,
}

struct SharedState {
	client: reqwest::Client,
	token_url: String,
	client_id: String,
	client_secret: String,
	project_override: Option<String>,
	discovery_endpoints: Vec<String>,

	inner: Mutex<CacheInner>,
	metrics: MetricCounters,
	cleanup_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

// endregion: --- Types

/// Cheap-clone handle over the process-wide credential state.
#[derive(Clone)]
pub struct TokenCache {
	shared: Arc<SharedState>,
}

// region:    --- Constructors

impl TokenCache {
	pub fn new(config: &ProxyConfig) -> Self {
		Self::with_urls(
			config,
			GOOGLE_TOKEN_URL.to_string(),
			crate::webc::ANTIGRAVITY_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
		)
	}

	/// Constructor with explicit endpoints (tests point these at mock servers).
	pub fn with_urls(config: &ProxyConfig, token_url: String, discovery_endpoints: Vec<String>) -> Self {
		Self {
			shared: Arc::new(SharedState {
				client: reqwest::Client::new(),
				token_url,
				client_id: config.client_id.clone(),
				client_secret: config.client_secret.clone(),
				project_override: config.project_id.clone(),
				discovery_endpoints,
				inner: Mutex::new(CacheInner::default()),
				metrics: MetricCounters::default(),
				cleanup_task: Mutex::new(None),
			}),
		}
	}
}

// endregion: --- Constructors

// region:    --- Access Token

impl TokenCache {
	pub async fn get_access_token(&self, refresh_token: &str) -> Result<String> {
		let shared = &self.shared;
		let now = now_ms();

		// -- Fast path: valid cached token
		{
			let mut inner = shared.inner.lock().await;
			if let Some(entry) = inner.entries.get_mut(refresh_token)
				&& entry.expires_at > now
			{
				entry.last_accessed_at = now;
				shared.metrics.hits.fetch_add(1, Ordering::Relaxed);
				return Ok(entry.access_token.clone());
			}
		}

		shared.metrics.misses.fetch_add(1, Ordering::Relaxed);
		self.ensure_cleanup_task().await;

		// -- Single flight: join an in-progress refresh for the same key
		let refresh = {
			let mut inner = shared.inner.lock().await;
			match inner.inflight.get(refresh_token) {
				Some(shared_refresh) => shared_refresh.clone(),
				None => {
					let shared_refresh = self.spawn_refresh(refresh_token.to_string());
					inner.inflight.insert(refresh_token.to_string(), shared_refresh.clone());
					shared_refresh
				}
			}
		};

		let refreshed = refresh.await?;
		Ok(refreshed.access_token)
	}

	/// The shared refresh future. Write-back, invalid-token eviction, and
	/// in-flight removal happen inside so they run exactly once per refresh,
	/// whatever the outcome.
	fn spawn_refresh(&self, refresh_token: String) -> SharedRefresh {
		let cache = self.clone();
		async move {
			let shared = &cache.shared;
			let result = refresh_access_token(shared, &refresh_token).await;

			let mut inner = shared.inner.lock().await;
			match &result {
				Ok(refreshed) => {
					let now = now_ms();
					let entry = inner.entries.entry(refresh_token.clone()).or_insert_with(|| CredentialEntry {
						access_token: String::new(),
						expires_at: 0,
						project_id: None,
						last_accessed_at: now,
					});
					entry.access_token = refreshed.access_token.clone();
					entry.expires_at = refreshed.expires_at;
					entry.last_accessed_at = now;
					shared.metrics.refreshes.fetch_add(1, Ordering::Relaxed);
				}
				Err(Error::InvalidToken { status, .. }) => {
					tracing::warn!("refresh token rejected by token endpoint (status {status}); evicting entry");
					inner.entries.remove(&refresh_token);
					inner.fingerprints.remove(&refresh_token);
				}
				Err(err) => {
					tracing::warn!("token refresh failed (entry kept): {err}");
				}
			}
			inner.inflight.remove(&refresh_token);
			evict_lru_if_needed(shared, &mut inner);

			result
		}
		.boxed()
		.shared()
	}
}

async fn refresh_access_token(shared: &SharedState, refresh_token: &str) -> Result<RefreshedToken> {
	let params = [
		("grant_type", "refresh_token"),
		("client_id", shared.client_id.as_str()),
		("client_secret", shared.client_secret.as_str()),
		("refresh_token", refresh_token),
	];

	let response = shared
		.client
		.post(&shared.token_url)
		.form(&params)
		.send()
		.await
		.map_err(|err| Error::Network { cause: err.to_string() })?;

	let status = response.status().as_u16();
	let body = response
		.text()
		.await
		.map_err(|err| Error::Network { cause: err.to_string() })?;

	match status {
		400 | 401 => return Err(Error::InvalidToken { status, body }),
		429 => return Err(Error::RateLimit { status, body }),
		s if !(200..300).contains(&s) => {
			return Err(Error::Network {
				cause: format!("token endpoint status {status}: {body}"),
			});
		}
		_ => {}
	}

	let parsed: Value = serde_json::from_str(&body).map_err(|err| Error::Network {
		cause: format!("invalid token endpoint response: {err}"),
	})?;
	let access_token = parsed
		.get("access_token")
		.and_then(Value::as_str)
		.ok_or_else(|| Error::Network {
			cause: "token endpoint response has no access_token".to_string(),
		})?
		.to_string();
	let expires_in = parsed.get("expires_in").and_then(Value::as_u64).unwrap_or(0);
	let expires_at = (now_ms() + expires_in * 1000).saturating_sub(EXPIRY_SAFETY_MARGIN_MS);

	Ok(RefreshedToken { access_token, expires_at })
}

// endregion: --- Access Token

// region:    --- Project Discovery

impl TokenCache {
	/// Discovered Cloud Code project id for this credential, if any.
	///
	/// The `ANTIGRAVITY_PROJECT_ID` override short-circuits discovery.
	pub async fn get_project_id(&self, refresh_token: &str) -> Result<Option<String>> {
		let shared = &self.shared;

		if let Some(project) = &shared.project_override {
			return Ok(Some(project.clone()));
		}

		{
			let inner = shared.inner.lock().await;
			if let Some(project) = inner.entries.get(refresh_token).and_then(|e| e.project_id.clone()) {
				return Ok(Some(project));
			}
		}

		let access_token = self.get_access_token(refresh_token).await?;
		let body = json!({
			"metadata": {
				"ideType": "IDE_UNSPECIFIED",
				"platform": "PLATFORM_UNSPECIFIED",
				"pluginType": "GEMINI",
			}
		});

		for endpoint in &shared.discovery_endpoints {
			let url = format!("{endpoint}/v1internal:loadCodeAssist");
			let response = match shared.client.post(&url).bearer_auth(&access_token).json(&body).send().await {
				Ok(res) if res.status().is_success() => res,
				Ok(res) => {
					tracing::debug!("project discovery on {endpoint} returned {}", res.status());
					continue;
				}
				Err(err) => {
					tracing::debug!("project discovery on {endpoint} failed: {err}");
					continue;
				}
			};

			let payload: Value = match response.json().await {
				Ok(payload) => payload,
				Err(_) => continue,
			};

			// `cloudaicompanionProject` is either a string or an object with an id.
			let project = match payload.get("cloudaicompanionProject") {
				Some(Value::String(id)) => Some(id.clone()),
				Some(Value::Object(obj)) => obj.get("id").and_then(Value::as_str).map(str::to_string),
				_ => None,
			};

			if let Some(project) = project {
				let mut inner = shared.inner.lock().await;
				if let Some(entry) = inner.entries.get_mut(refresh_token) {
					entry.project_id = Some(project.clone());
				}
				return Ok(Some(project));
			}
		}

		tracing::warn!("project discovery exhausted all endpoints");
		Ok(None)
	}
}

// endregion: --- Project Discovery

// region:    --- Fingerprints

impl TokenCache {
	pub async fn fingerprint_headers(&self, refresh_token: &str) -> Fingerprint {
		let mut inner = self.shared.inner.lock().await;
		inner
			.fingerprints
			.entry(refresh_token.to_string())
			.or_insert_with(|| derive_fingerprint(refresh_token))
			.clone()
	}
}

// endregion: --- Fingerprints

// region:    --- Eviction & Lifecycle

fn evict_lru_if_needed(shared: &SharedState, inner: &mut CacheInner) {
	if inner.entries.len() <= MAX_ENTRIES {
		return;
	}
	let excess = inner.entries.len() - MAX_ENTRIES;

	let mut by_age: Vec<(String, u64)> = inner
		.entries
		.iter()
		.map(|(key, entry)| (key.clone(), entry.last_accessed_at))
		.collect();
	by_age.sort_by_key(|(_, last_accessed_at)| *last_accessed_at);

	for (key, _) in by_age.into_iter().take(excess) {
		inner.entries.remove(&key);
		inner.fingerprints.remove(&key);
		shared.metrics.evicted_by_lru.fetch_add(1, Ordering::Relaxed);
	}
}

impl TokenCache {
	async fn ensure_cleanup_task(&self) {
		let mut guard = self.shared.cleanup_task.lock().await;
		if guard.is_some() {
			return;
		}
		let weak: Weak<SharedState> = Arc::downgrade(&self.shared);
		*guard = Some(tokio::spawn(async move {
			let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
			interval.tick().await; // immediate first tick
			loop {
				interval.tick().await;
				let Some(shared) = weak.upgrade() else { break };
				let cache = TokenCache { shared };
				cache.cleanup_expired().await;
			}
		}));
	}

	/// Removes expired entries (their fingerprints go with them).
	pub async fn cleanup_expired(&self) {
		let now = now_ms();
		let mut inner = self.shared.inner.lock().await;
		let expired: Vec<String> = inner
			.entries
			.iter()
			.filter(|(_, entry)| entry.expires_at <= now)
			.map(|(key, _)| key.clone())
			.collect();
		for key in expired {
			inner.entries.remove(&key);
			inner.fingerprints.remove(&key);
			self.shared.metrics.evicted_by_cleanup.fetch_add(1, Ordering::Relaxed);
		}
	}

	pub fn metrics(&self) -> CacheMetrics {
		let metrics = &self.shared.metrics;
		CacheMetrics {
			hits: metrics.hits.load(Ordering::Relaxed),
			misses: metrics.misses.load(Ordering::Relaxed),
			refreshes: metrics.refreshes.load(Ordering::Relaxed),
			evicted_by_cleanup: metrics.evicted_by_cleanup.load(Ordering::Relaxed),
			evicted_by_lru: metrics.evicted_by_lru.load(Ordering::Relaxed),
		}
	}

	/// Test hook: drops every entry and fingerprint.
	pub async fn clear_cache(&self) {
		let mut inner = self.shared.inner.lock().await;
		inner.entries.clear();
		inner.fingerprints.clear();
	}

	/// Test hook: stops the periodic cleanup task (restarted on next miss).
	pub async fn reset_cleanup_timer(&self) {
		let mut guard = self.shared.cleanup_task.lock().await;
		if let Some(handle) = guard.take() {
			handle.abort();
		}
	}
}

// endregion: --- Eviction & Lifecycle

fn now_ms() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_millis() as u64)
		.unwrap_or(0)
}

// region:    --- Tests


// endregion: --- Tests
