//! OpenAI message/tool list to Gemini `contents` / `systemInstruction` /
//! `tools` translation.

use crate::chat::{ChatMessage, ChatRole, ContentPart, MessageContent, ToolDef, new_call_id};
use crate::gemini::{SKIP_THOUGHT_SIGNATURE, clean_light, clean_strict, is_claude_model};
use regex::Regex;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::LazyLock;

static DATA_URI_RX: LazyLock<Regex> = LazyLock::new(|| {
	// data:image/<subtype>;base64,<payload>
	Regex::new(r"^data:(image/[\w.+-]+);base64,(.+)$").expect("invalid data-uri regex")
});

// region:    --- GeminiParts

#[derive(Debug, Default)]
pub struct GeminiParts {
	pub system_instruction: Option<String>,
	pub contents: Vec<Value>,
}

// endregion: --- GeminiParts

// region:    --- Messages

/// Builds the Gemini `contents` list (and the extracted system instruction)
/// from an OpenAI message list. Strictly sequential; assistant tool-call ids
/// are synthesized when missing and bound to later tool responses through a
/// per-function-name FIFO queue.
pub fn to_gemini_parts(messages: &[ChatMessage]) -> GeminiParts {
	let mut system_instruction: Option<String> = None;
	let mut contents: Vec<Value> = Vec::new();
	// function name -> pending tool-call ids, oldest first
	let mut pending_call_ids: HashMap<String, VecDeque<String>> = HashMap::new();

	for msg in messages {
		match msg.role {
			ChatRole::System => {
				if let Some(content) = &msg.content {
					system_instruction = Some(content.joined_texts());
				}
			}
			ChatRole::Assistant if msg.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty()) => {
				let mut parts: Vec<Value> = Vec::new();

				if let Some(text) = msg.content.as_ref().and_then(MessageContent::as_text)
					&& !text.is_empty()
				{
					parts.push(json!({"text": text}));
				}

				for call in msg.tool_calls.as_deref().unwrap_or_default() {
					let id = match call.id.as_deref().filter(|id| !id.is_empty()) {
						Some(id) => id.to_string(),
						None => new_call_id(),
					};
					let args: Value = serde_json::from_str(&call.function.arguments).unwrap_or_else(|_| json!({}));

					parts.push(json!({
						"functionCall": {
							"id": id,
							"name": call.function.name,
							"args": args,
						},
						"thoughtSignature": SKIP_THOUGHT_SIGNATURE,
					}));

					pending_call_ids.entry(call.function.name.clone()).or_default().push_back(id);
				}

				contents.push(json!({"role": "model", "parts": parts}));
			}
			ChatRole::Tool => {
				let name = msg.name.clone().unwrap_or_default();
				let id = msg
					.tool_call_id
					.clone()
					.filter(|id| !id.is_empty())
					.or_else(|| pending_call_ids.get_mut(&name).and_then(VecDeque::pop_front))
					.unwrap_or_else(|| "unknown".to_string());
				let result = msg.content.as_ref().map(MessageContent::joined_texts).unwrap_or_default();

				contents.push(json!({
					"role": "user",
					"parts": [{
						"functionResponse": {
							"id": id,
							"name": name,
							"response": {"result": result},
						}
					}],
				}));
			}
			ChatRole::User | ChatRole::Assistant => {
				let role = if msg.role == ChatRole::User { "user" } else { "model" };
				let parts = content_to_parts(msg.content.as_ref());
				if !parts.is_empty() {
					contents.push(json!({"role": role, "parts": parts}));
				}
			}
		}
	}

	GeminiParts {
		system_instruction,
		contents,
	}
}

fn content_to_parts(content: Option<&MessageContent>) -> Vec<Value> {
	let mut parts: Vec<Value> = Vec::new();
	match content {
		Some(MessageContent::Text(text)) => {
			parts.push(json!({"text": text}));
		}
		Some(MessageContent::Parts(items)) => {
			for item in items {
				match item {
					ContentPart::Text { text } => parts.push(json!({"text": text})),
					ContentPart::ImageUrl { image_url } => {
						// Only data URIs can be forwarded inline; remote URLs are skipped.
						if let Some(caps) = DATA_URI_RX.captures(&image_url.url) {
							parts.push(json!({
								"inlineData": {
									"mimeType": &caps[1],
									"data": &caps[2],
								}
							}));
						}
					}
				}
			}
		}
		None => {}
	}
	parts
}

// endregion: --- Messages

// region:    --- Tools

/// Wraps all declarations into the single `functionDeclarations` group,
/// sanitizing each parameter schema for the target model family.
pub fn to_gemini_tools(tools: &[ToolDef], model: &str) -> Value {
	let strict = is_claude_model(model);

	let declarations: Vec<Value> = tools
		.iter()
		.map(|tool| {
			let parameters = tool.function.parameters.as_ref().map(|schema| {
				if strict {
					clean_strict(schema)
				} else {
					clean_light(schema)
				}
			});

			let mut declaration = json!({
				"name": tool.function.name,
				"description": tool.function.description,
			});
			if let Some(parameters) = parameters
				&& let Some(obj) = declaration.as_object_mut()
			{
				obj.insert("parameters".to_string(), parameters);
			}
			declaration
		})
		.collect();

	json!([{"functionDeclarations": declarations}])
}

// endregion: --- Tools

// region:    --- Tests

#[cfg(test)]
mod tests {
	use super::*;

	fn messages_from(value: Value) -> Vec<ChatMessage> {
		serde_json::from_value(value).expect("invalid test messages")
	}

	#[test]
	fn test_system_and_text_messages() {
		let messages = messages_from(json!([
			{"role": "system", "content": "Be terse"},
			{"role": "user", "content": "Hello"},
			{"role": "assistant", "content": "Hi"},
		]));
		let parts = to_gemini_parts(&messages);

		assert_eq!(parts.system_instruction.as_deref(), Some("Be terse"));
		assert_eq!(parts.contents.len(), 2);
		assert_eq!(parts.contents[0]["role"], "user");
		assert_eq!(parts.contents[0]["parts"][0]["text"], "Hello");
		assert_eq!(parts.contents[1]["role"], "model");
	}

	#[test]
	fn test_last_system_wins() {
		let messages = messages_from(json!([
			{"role": "system", "content": "One"},
			{"role": "user", "content": "Hi"},
			{"role": "system", "content": "Two"},
		]));
		let parts = to_gemini_parts(&messages);
		assert_eq!(parts.system_instruction.as_deref(), Some("Two"));
	}

	#[test]
	fn test_assistant_tool_calls_and_binding() {
		let messages = messages_from(json!([
			{"role": "user", "content": "Weather?"},
			{"role": "assistant", "content": "Looking it up.", "tool_calls": [
				{"id": "call_weather_1", "function": {"name": "get_weather", "arguments": "{\"city\":\"São Paulo\"}"}}
			]},
			{"role": "tool", "name": "get_weather", "content": "{\"temp\": 25}"},
		]));
		let parts = to_gemini_parts(&messages);

		let model_entry = &parts.contents[1];
		assert_eq!(model_entry["role"], "model");
		assert_eq!(model_entry["parts"][0]["text"], "Looking it up.");
		let call = &model_entry["parts"][1]["functionCall"];
		assert_eq!(call["id"], "call_weather_1");
		assert_eq!(call["name"], "get_weather");
		assert_eq!(call["args"]["city"], "São Paulo");
		assert_eq!(model_entry["parts"][1]["thoughtSignature"], SKIP_THOUGHT_SIGNATURE);

		// Tool response binds to the pending id by function name
		let tool_entry = &parts.contents[2];
		assert_eq!(tool_entry["role"], "user");
		let response = &tool_entry["parts"][0]["functionResponse"];
		assert_eq!(response["id"], "call_weather_1");
		assert_eq!(response["name"], "get_weather");
		assert_eq!(response["response"]["result"], "{\"temp\": 25}");
	}

	#[test]
	fn test_missing_tool_call_id_synthesized_and_bound() {
		let messages = messages_from(json!([
			{"role": "assistant", "tool_calls": [
				{"function": {"name": "search", "arguments": "{}"}}
			]},
			{"role": "tool", "name": "search", "content": "ok"},
		]));
		let parts = to_gemini_parts(&messages);

		let call_id = parts.contents[0]["parts"][0]["functionCall"]["id"]
			.as_str()
			.unwrap()
			.to_string();
		assert!(call_id.starts_with("call_"));
		assert_eq!(parts.contents[1]["parts"][0]["functionResponse"]["id"], call_id);
	}

	#[test]
	fn test_tool_without_match_is_unknown() {
		let messages = messages_from(json!([
			{"role": "tool", "name": "orphan", "content": "ok"},
		]));
		let parts = to_gemini_parts(&messages);
		assert_eq!(parts.contents[0]["parts"][0]["functionResponse"]["id"], "unknown");
	}

	#[test]
	fn test_bad_tool_arguments_become_empty_object() {
		let messages = messages_from(json!([
			{"role": "assistant", "tool_calls": [
				{"id": "call_x", "function": {"name": "search", "arguments": "not json"}}
			]},
		]));
		let parts = to_gemini_parts(&messages);
		assert_eq!(parts.contents[0]["parts"][0]["functionCall"]["args"], json!({}));
	}

	#[test]
	fn test_image_parts() {
		let messages = messages_from(json!([
			{"role": "user", "content": [
				{"type": "text", "text": "What is this?"},
				{"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}},
				{"type": "image_url", "image_url": {"url": "https://example.com/cat.png"}},
			]},
		]));
		let parts = to_gemini_parts(&messages);

		let entry_parts = parts.contents[0]["parts"].as_array().unwrap();
		assert_eq!(entry_parts.len(), 2);
		assert_eq!(entry_parts[1]["inlineData"]["mimeType"], "image/png");
		assert_eq!(entry_parts[1]["inlineData"]["data"], "AAAA");
	}

	#[test]
	fn test_empty_content_suppresses_entry() {
		let messages = messages_from(json!([
			{"role": "user", "content": [
				{"type": "image_url", "image_url": {"url": "https://example.com/cat.png"}},
			]},
			{"role": "user", "content": "real"},
		]));
		let parts = to_gemini_parts(&messages);
		assert_eq!(parts.contents.len(), 1);
		assert_eq!(parts.contents[0]["parts"][0]["text"], "real");
	}

	#[test]
	fn test_tools_sanitized_per_family() {
		let tools: Vec<ToolDef> = serde_json::from_value(json!([
			{"type": "function", "function": {
				"name": "set_status",
				"description": "Set status",
				"parameters": {"type": "object", "properties": {"status": {"type": "string", "const": "active"}}}
			}}
		]))
		.unwrap();

		// Claude-family: strict pipeline turns const into enum
		let strict = to_gemini_tools(&tools, "claude-sonnet-4-5");
		let decl = &strict[0]["functionDeclarations"][0];
		assert_eq!(decl["name"], "set_status");
		assert_eq!(decl["parameters"]["properties"]["status"]["enum"], json!(["active"]));

		// Gemini: light pipeline keeps const
		let light = to_gemini_tools(&tools, "gemini-3-flash");
		let decl = &light[0]["functionDeclarations"][0];
		assert_eq!(decl["parameters"]["properties"]["status"]["const"], "active");
	}
}

// endregion: --- Tests
