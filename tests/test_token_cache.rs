use agproxy::auth::{Error, TokenCache};
use agproxy::config::ProxyConfig;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

fn cache_for(token_server: &MockServer, discovery: Vec<String>) -> TokenCache {
	let config = ProxyConfig::default();
	TokenCache::with_urls(&config, format!("{}/token", token_server.uri()), discovery)
}

fn token_response(access_token: &str, expires_in: u64) -> ResponseTemplate {
	ResponseTemplate::new(200).set_body_json(json!({
		"access_token": access_token,
		"expires_in": expires_in,
		"token_type": "Bearer",
	}))
}

// region:    --- Refresh & Single Flight

#[tokio::test]
async fn test_refresh_then_cache_hit() -> Result<()> {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/token"))
		.and(body_string_contains("grant_type=refresh_token"))
		.respond_with(token_response("access-1", 3600))
		.expect(1)
		.mount(&server)
		.await;

	let cache = cache_for(&server, vec![]);
	let first = cache.get_access_token("refresh-a").await?;
	let second = cache.get_access_token("refresh-a").await?;

	assert_eq!(first, "access-1");
	assert_eq!(second, "access-1");
	let metrics = cache.metrics();
	assert_eq!(metrics.misses, 1);
	assert_eq!(metrics.hits, 1);
	assert_eq!(metrics.refreshes, 1);
	Ok(())
}

#[tokio::test]
async fn test_single_flight_refresh() -> Result<()> {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/token"))
		.respond_with(token_response("access-sf", 3600).set_delay(Duration::from_millis(200)))
		.expect(1)
		.mount(&server)
		.await;

	let cache = cache_for(&server, vec![]);
	let (a, b, c) = tokio::join!(
		cache.get_access_token("refresh-sf"),
		cache.get_access_token("refresh-sf"),
		cache.get_access_token("refresh-sf"),
	);

	let (a, b, c) = (a?, b?, c?);
	assert_eq!(a, "access-sf");
	assert_eq!(a, b);
	assert_eq!(b, c);
	assert_eq!(cache.metrics().refreshes, 1);
	Ok(())
}

#[tokio::test]
async fn test_short_expiry_triggers_second_refresh() -> Result<()> {
	let server = MockServer::start().await;
	// expires_in below the one-minute safety margin: the token is already stale.
	Mock::given(method("POST"))
		.and(path("/token"))
		.respond_with(token_response("access-stale", 30))
		.expect(2)
		.mount(&server)
		.await;

	let cache = cache_for(&server, vec![]);
	cache.get_access_token("refresh-x").await?;
	cache.get_access_token("refresh-x").await?;

	let metrics = cache.metrics();
	assert_eq!(metrics.misses, 2);
	assert_eq!(metrics.refreshes, 2);
	Ok(())
}

// endregion: --- Refresh & Single Flight

// region:    --- Failure Taxonomy

#[tokio::test]
async fn test_invalid_token_surfaces_and_evicts() -> Result<()> {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/token"))
		.respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
		.mount(&server)
		.await;

	let cache = cache_for(&server, vec![]);
	let err = cache
		.get_access_token("refresh-bad")
		.await
		.expect_err("400 from token endpoint should surface");
	assert!(matches!(err, Error::InvalidToken { status: 400, .. }));
	Ok(())
}

#[tokio::test]
async fn test_rate_limit_error_kind() -> Result<()> {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/token"))
		.respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
		.mount(&server)
		.await;

	let cache = cache_for(&server, vec![]);
	let err = cache
		.get_access_token("refresh-429")
		.await
		.expect_err("429 should surface");
	assert!(matches!(err, Error::RateLimit { status: 429, .. }));
	Ok(())
}

#[tokio::test]
async fn test_server_error_is_network_kind() -> Result<()> {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/token"))
		.respond_with(ResponseTemplate::new(500).set_body_string("boom"))
		.mount(&server)
		.await;

	let cache = cache_for(&server, vec![]);
	let err = cache
		.get_access_token("refresh-500")
		.await
		.expect_err("500 should surface");
	assert!(matches!(err, Error::Network { .. }));
	Ok(())
}

// endregion: --- Failure Taxonomy

// region:    --- Project Discovery

#[tokio::test]
async fn test_project_discovery_string_form() -> Result<()> {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/token"))
		.respond_with(token_response("access-p", 3600))
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/v1internal:loadCodeAssist"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"cloudaicompanionProject": "proj-string"})))
		.mount(&server)
		.await;

	let cache = cache_for(&server, vec![server.uri()]);
	let project = cache.get_project_id("refresh-p").await?;
	assert_eq!(project.as_deref(), Some("proj-string"));

	// Second lookup comes from the credential entry, not the network
	let again = cache.get_project_id("refresh-p").await?;
	assert_eq!(again.as_deref(), Some("proj-string"));
	Ok(())
}

#[tokio::test]
async fn test_project_discovery_object_form_with_failover() -> Result<()> {
	let token_server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/token"))
		.respond_with(token_response("access-p2", 3600))
		.mount(&token_server)
		.await;

	let broken = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1internal:loadCodeAssist"))
		.respond_with(ResponseTemplate::new(503))
		.mount(&broken)
		.await;

	let healthy = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1internal:loadCodeAssist"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"cloudaicompanionProject": {"id": "proj-object"}})))
		.mount(&healthy)
		.await;

	let cache = cache_for(&token_server, vec![broken.uri(), healthy.uri()]);
	let project = cache.get_project_id("refresh-p2").await?;
	assert_eq!(project.as_deref(), Some("proj-object"));
	Ok(())
}

#[tokio::test]
async fn test_project_discovery_exhausted_is_absent() -> Result<()> {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/token"))
		.respond_with(token_response("access-p3", 3600))
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/v1internal:loadCodeAssist"))
		.respond_with(ResponseTemplate::new(404))
		.mount(&server)
		.await;

	let cache = cache_for(&server, vec![server.uri()]);
	let project = cache.get_project_id("refresh-p3").await?;
	assert_eq!(project, None);
	Ok(())
}

// endregion: --- Project Discovery

// region:    --- Fingerprints

#[tokio::test]
async fn test_fingerprint_headers_cached() -> Result<()> {
	let server = MockServer::start().await;
	let cache = cache_for(&server, vec![]);

	let first = cache.fingerprint_headers("refresh-fp").await;
	let second = cache.fingerprint_headers("refresh-fp").await;
	assert_eq!(first.quota_user, second.quota_user);
	assert_eq!(first.device_id.len(), 32);
	Ok(())
}

// endregion: --- Fingerprints
