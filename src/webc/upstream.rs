//! Upstream generate client: posts the wrapped payload across the style's
//! endpoint list with capacity backoff, then falls back across wire styles
//! for non-Claude models.

use crate::gemini::{is_claude_model, resolve_model_for_header_style};
use crate::webc::{Error, HeaderStyle, Result, pick_profile};
use serde_json::{Value, json};
use std::time::Duration;
use value_ext::JsonValueExt;

/// Failover order: daily sandbox, autopush sandbox, production.
pub const ANTIGRAVITY_ENDPOINTS: &[&str] = &[
	"https://daily-cloudcode-pa.sandbox.googleapis.com",
	"https://autopush-cloudcode-pa.sandbox.googleapis.com",
	"https://cloudcode-pa.googleapis.com",
];

pub const GEMINI_CLI_ENDPOINTS: &[&str] = &["https://cloudcode-pa.googleapis.com"];

const GENERATE_PATH: &str = "/v1internal:streamGenerateContent?alt=sse";

const MAX_CAPACITY_ATTEMPTS: u32 = 5;
const BACKOFF_CAP_MS: u64 = 8000;
const BACKOFF_JITTER_MS: u64 = 500;

// region:    --- CapacityReason

#[derive(Debug, Clone, Copy)]
enum CapacityReason {
	ModelCapacityExhausted,
	ServerError,
}

/// Reason tag parsed out of a 429/503 body. Both tags get the same bounded
/// backoff; the distinction only feeds the logs.
fn capacity_reason(body: &str) -> Option<CapacityReason> {
	if body.contains("RESOURCE_EXHAUSTED") || body.contains("MODEL_CAPACITY_EXHAUSTED") {
		Some(CapacityReason::ModelCapacityExhausted)
	} else if body.contains("INTERNAL") || body.contains("SERVER_ERROR") {
		Some(CapacityReason::ServerError)
	} else {
		None
	}
}

// endregion: --- CapacityReason

// region:    --- UpstreamClient

pub struct UpstreamClient {
	client: reqwest::Client,
	antigravity_endpoints: Vec<String>,
	gemini_cli_endpoints: Vec<String>,
}

impl Default for UpstreamClient {
	fn default() -> Self {
		Self::new()
	}
}

impl UpstreamClient {
	pub fn new() -> Self {
		Self::with_endpoints(
			ANTIGRAVITY_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
			GEMINI_CLI_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
		)
	}

	/// Constructor with explicit endpoint lists (tests point these at mock servers).
	pub fn with_endpoints(antigravity_endpoints: Vec<String>, gemini_cli_endpoints: Vec<String>) -> Self {
		Self {
			client: reqwest::Client::new(),
			antigravity_endpoints,
			gemini_cli_endpoints,
		}
	}

	/// Posts the payload, traversing the style's endpoint list with capacity
	/// backoff. When every antigravity endpoint fails for a non-Claude model,
	/// retries once with the gemini-cli style and a rebuilt payload.
	pub async fn request(
		&self,
		payload: Value,
		access_token: &str,
		style: HeaderStyle,
		fingerprint: Option<&crate::auth::Fingerprint>,
	) -> Result<reqwest::Response> {
		let model: String = payload.x_get("model").unwrap_or_default();
		let claude = is_claude_model(&model);

		let mut payload = payload;
		let mut style = style;
		loop {
			match self.request_with_style(&payload, access_token, style, fingerprint).await {
				Ok(response) => return Ok(response),
				Err(err) => {
					if style == HeaderStyle::Antigravity && !claude {
						tracing::warn!("all antigravity endpoints failed ({err}); retrying with gemini-cli style");
						payload = rebuild_for_gemini_cli(payload);
						style = HeaderStyle::GeminiCli;
						continue;
					}
					return Err(err);
				}
			}
		}
	}

	async fn request_with_style(
		&self,
		payload: &Value,
		access_token: &str,
		style: HeaderStyle,
		fingerprint: Option<&crate::auth::Fingerprint>,
	) -> Result<reqwest::Response> {
		let endpoints = match style {
			HeaderStyle::Antigravity => &self.antigravity_endpoints,
			HeaderStyle::GeminiCli => &self.gemini_cli_endpoints,
		};

		let mut last_error: Option<Error> = None;

		'endpoints: for endpoint in endpoints {
			let url = format!("{endpoint}{GENERATE_PATH}");

			for attempt in 0..MAX_CAPACITY_ATTEMPTS {
				let response = match self.send(&url, payload, access_token, style, fingerprint).await {
					Ok(response) => response,
					Err(err) => {
						tracing::warn!("endpoint {endpoint} unreachable: {err}");
						last_error = Some(err.into());
						continue 'endpoints;
					}
				};

				let status = response.status();
				if status.is_success() {
					return Ok(response);
				}

				let status = status.as_u16();
				let body = response.text().await.unwrap_or_default();

				if status == 429 || status == 503 {
					let reason = capacity_reason(&body);
					last_error = Some(Error::UpstreamStatus { status, body });

					if let Some(reason) = reason
						&& attempt + 1 < MAX_CAPACITY_ATTEMPTS
					{
						let backoff_ms = (1000u64 << attempt).min(BACKOFF_CAP_MS) + fastrand::u64(0..BACKOFF_JITTER_MS);
						tracing::debug!(
							"endpoint {endpoint} {reason:?} (attempt {attempt}); backing off {backoff_ms}ms"
						);
						tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
						continue;
					}
					continue 'endpoints;
				}

				tracing::warn!("endpoint {endpoint} returned {status}");
				last_error = Some(Error::UpstreamStatus { status, body });
				continue 'endpoints;
			}
		}

		Err(last_error.unwrap_or(Error::NoEndpoints))
	}

	async fn send(
		&self,
		url: &str,
		payload: &Value,
		access_token: &str,
		style: HeaderStyle,
		fingerprint: Option<&crate::auth::Fingerprint>,
	) -> reqwest::Result<reqwest::Response> {
		let profile = pick_profile(style);

		let mut builder = self
			.client
			.post(url)
			.header("Content-Type", "application/json")
			.header("Accept", "text/event-stream")
			.bearer_auth(access_token)
			.header("anthropic-beta", "interleaved-thinking-2025-05-14")
			.header("User-Agent", profile.user_agent)
			.header("X-Goog-Api-Client", profile.api_client)
			.header("Client-Metadata", profile.client_metadata);

		if style == HeaderStyle::Antigravity
			&& let Some(fingerprint) = fingerprint
		{
			builder = builder
				.header("X-Goog-QuotaUser", &fingerprint.quota_user)
				.header("X-Client-Device-Id", &fingerprint.device_id);
		}

		builder.json(payload).send().await
	}
}

// endregion: --- UpstreamClient

// region:    --- Payload Rewrite

/// The gemini-cli style takes a bare Gemini payload: no antigravity envelope
/// metadata, and the canonical (`-preview`) model id.
fn rebuild_for_gemini_cli(mut payload: Value) -> Value {
	if let Some(obj) = payload.as_object_mut() {
		obj.remove("requestType");
		obj.remove("userAgent");
		obj.remove("requestId");

		let model = obj.get("model").and_then(Value::as_str).unwrap_or_default().to_string();
		let resolved = resolve_model_for_header_style(&model, HeaderStyle::GeminiCli);
		obj.insert("model".to_string(), json!(resolved));
	}
	payload
}

// endregion: --- Payload Rewrite

// region:    --- Tests


// endregion: --- Tests
