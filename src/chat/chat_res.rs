use serde_json::{Value, json};
use std::collections::HashSet;
use uuid::Uuid;

// region:    --- Ids & Time

/// `chatcmpl-<29 chars>` completion/chunk id.
pub fn new_completion_id() -> String {
	let hex = Uuid::new_v4().simple().to_string();
	format!("chatcmpl-{}", &hex[..29])
}

/// `call_<24 hex chars>` synthesized tool-call id.
pub fn new_call_id() -> String {
	let hex = Uuid::new_v4().simple().to_string();
	format!("call_{}", &hex[..24])
}

pub fn unix_now_secs() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}

// endregion: --- Ids & Time

// region:    --- Chunk Envelope

/// Adds the per-response OpenAI envelope fields to a transformer chunk
/// (which carries only `choices`).
pub fn enrich_chunk(chunk: &mut Value, id: &str, created: u64, model: &str) {
	if let Some(obj) = chunk.as_object_mut() {
		obj.insert("id".to_string(), json!(id));
		obj.insert("object".to_string(), json!("chat.completion.chunk"));
		obj.insert("created".to_string(), json!(created));
		obj.insert("model".to_string(), json!(model));
	}
}

// endregion: --- Chunk Envelope

// region:    --- CompletionAccumulator

/// Folds transformer chunks into a single non-streaming completion.
///
/// Text deltas are concatenated; tool-call deltas are collected verbatim,
/// deduplicated by (id, name).
#[derive(Debug, Default)]
pub struct CompletionAccumulator {
	content: String,
	tool_calls: Vec<Value>,
	seen_calls: HashSet<(String, String)>,
	finish_reason: Option<String>,
}

impl CompletionAccumulator {
	pub fn push_chunk(&mut self, chunk: &Value) {
		let Some(choice) = chunk.pointer("/choices/0") else {
			return;
		};

		if let Some(text) = choice.pointer("/delta/content").and_then(Value::as_str) {
			self.content.push_str(text);
		}

		if let Some(calls) = choice.pointer("/delta/tool_calls").and_then(Value::as_array) {
			for call in calls {
				let id = call.pointer("/id").and_then(Value::as_str).unwrap_or_default();
				let name = call.pointer("/function/name").and_then(Value::as_str).unwrap_or_default();
				if self.seen_calls.insert((id.to_string(), name.to_string())) {
					self.tool_calls.push(call.clone());
				}
			}
		}

		if let Some(reason) = choice.get("finish_reason").and_then(Value::as_str) {
			self.finish_reason = Some(reason.to_string());
		}
	}

	pub fn into_completion(self, id: &str, created: u64, model: &str) -> Value {
		let has_tool_calls = !self.tool_calls.is_empty();

		let content = if self.content.is_empty() {
			Value::Null
		} else {
			Value::String(self.content)
		};

		let mut message = json!({
			"role": "assistant",
			"content": content,
		});
		if has_tool_calls
			&& let Some(obj) = message.as_object_mut()
		{
			obj.insert("tool_calls".to_string(), Value::Array(self.tool_calls));
		}

		let finish_reason = if has_tool_calls {
			"tool_calls".to_string()
		} else {
			self.finish_reason.unwrap_or_else(|| "stop".to_string())
		};

		json!({
			"id": id,
			"object": "chat.completion",
			"created": created,
			"model": model,
			"choices": [{
				"index": 0,
				"message": message,
				"finish_reason": finish_reason,
			}],
			"usage": {
				"prompt_tokens": 0,
				"completion_tokens": 0,
				"total_tokens": 0,
			},
		})
	}
}

// endregion: --- CompletionAccumulator

// region:    --- Tests


// endregion: --- Tests
