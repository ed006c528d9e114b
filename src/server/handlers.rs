//! Route handlers. The chat handler is the request orchestrator: it glues
//! translator, sanitizer, reasoning mapper, credential cache, and upstream
//! client together, then streams or accumulates the transformed response.

use crate::chat::{ChatCompletionRequest, new_completion_id, unix_now_secs};
use crate::gemini::{
	GeminiParts, GeminiStreamer, apply_thinking_config, is_claude_model, normalize_model_for_antigravity,
	to_gemini_parts, to_gemini_tools,
};
use crate::server::{AppState, accumulate_completion, models_payload, sse_response};
use crate::webc::HeaderStyle;
use crate::{Error, Result};
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use uuid::Uuid;
use value_ext::JsonValueExt;

// region:    --- Service Routes

pub async fn health() -> Json<Value> {
	Json(json!({"status": "ok", "service": "antigravity-openai-proxy"}))
}

pub async fn metrics(State(state): State<AppState>) -> Json<Value> {
	Json(json!({
		"oauth": {
			"cache": state.cache.metrics(),
			"uptime": state.started_at.elapsed().as_secs(),
		}
	}))
}

pub async fn models() -> Json<Value> {
	Json(models_payload(unix_now_secs()))
}

// endregion: --- Service Routes

// region:    --- Chat Completions

pub async fn chat_completions(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
	match handle_chat(state, headers, body).await {
		Ok(response) => response,
		Err(err) => error_response(err),
	}
}

async fn handle_chat(state: AppState, headers: HeaderMap, body: Bytes) -> Result<Response> {
	// -- Credentials come per-request from the Authorization header
	let refresh_token = headers
		.get(header::AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "))
		.map(str::trim)
		.filter(|token| !token.is_empty())
		.ok_or(Error::MissingAuthorization)?
		.to_string();

	let req: ChatCompletionRequest =
		serde_json::from_slice(&body).map_err(|err| Error::bad_request(format!("invalid JSON body: {err}")))?;
	if req.messages.is_empty() {
		return Err(Error::bad_request("messages is required and cannot be empty"));
	}

	let model = req.model.clone().unwrap_or_else(|| "gemini-3-flash".to_string());
	let stream = req.stream.unwrap_or(true);
	let claude = is_claude_model(&model);
	let effort = req.reasoning_effort;

	tracing::debug!("chat completion for model {model} (stream: {stream})");

	// -- Translate messages and tools
	let GeminiParts {
		system_instruction,
		contents,
	} = to_gemini_parts(&req.messages);
	let tools = req
		.tools
		.as_deref()
		.filter(|tools| !tools.is_empty())
		.map(|tools| to_gemini_tools(tools, &model));

	// -- Generation config
	let mut gen_config = json!({});
	if let Some(max_tokens) = req.max_tokens {
		gen_config.x_insert("maxOutputTokens", max_tokens)?;
	}
	if let Some(temperature) = req.temperature {
		gen_config.x_insert("temperature", temperature)?;
	}
	if let Some(top_p) = req.top_p {
		gen_config.x_insert("topP", top_p)?;
	}
	if let Some(stop) = &req.stop {
		let sequences = match stop {
			Value::Array(list) => list.clone(),
			scalar => vec![scalar.clone()],
		};
		gen_config.x_insert("stopSequences", sequences)?;
	}
	apply_thinking_config(&mut gen_config, &model, effort, state.config.thinking_budget)?;

	// -- Credentials and fingerprint
	let access_token = state.cache.get_access_token(&refresh_token).await?;
	let project_id = state.cache.get_project_id(&refresh_token).await?;
	let fingerprint = state.cache.fingerprint_headers(&refresh_token).await;

	// -- Compose the upstream payload
	let mut request = json!({
		"contents": contents,
		"sessionId": format!("session-{}", Uuid::new_v4()),
	});
	if let Some(tools) = tools {
		// VALIDATED tool mode exists only on the Claude side of Antigravity.
		if claude {
			request.x_insert("toolConfig", json!({"functionCallingConfig": {"mode": "VALIDATED"}}))?;
		}
		request.x_insert("tools", tools)?;
	}
	if gen_config.as_object().map(|obj| !obj.is_empty()).unwrap_or(false) {
		request.x_insert("generationConfig", gen_config)?;
	}
	if let Some(system) = system_instruction {
		request.x_insert("systemInstruction", json!({"role": "user", "parts": [{"text": system}]}))?;
	}

	let mut payload = json!({
		"model": normalize_model_for_antigravity(&model, effort),
		"userAgent": "antigravity",
		"requestId": format!("agent-{}", Uuid::new_v4()),
		"requestType": "agent",
		"request": request,
	});
	if let Some(project) = project_id {
		payload.x_insert("project", project)?;
	}

	// -- Upstream call (may fall back across wire styles for non-Claude models)
	let style = if claude {
		HeaderStyle::Antigravity
	} else {
		HeaderStyle::GeminiCli
	};
	let response = state
		.upstream
		.request(payload, &access_token, style, Some(&fingerprint))
		.await?;
	if response.content_length() == Some(0) {
		return Err(Error::EmptyUpstreamBody);
	}

	// -- Transform and answer
	let completion_id = new_completion_id();
	let created = unix_now_secs();
	let streamer = GeminiStreamer::from_response(response, state.config.keep_thinking);

	if stream {
		Ok(sse_response(streamer, completion_id, created, model))
	} else {
		let completion = accumulate_completion(streamer, &completion_id, created, &model).await;
		Ok(Json(completion).into_response())
	}
}

fn error_response(err: Error) -> Response {
	let status = match &err {
		Error::MissingAuthorization => StatusCode::UNAUTHORIZED,
		Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
		Error::EmptyUpstreamBody => StatusCode::BAD_GATEWAY,
		_ => StatusCode::INTERNAL_SERVER_ERROR,
	};

	if status.is_server_error() {
		tracing::error!("chat completion failed: {err}");
	}

	(status, Json(json!({"error": {"message": err.to_string()}}))).into_response()
}

// endregion: --- Chat Completions
