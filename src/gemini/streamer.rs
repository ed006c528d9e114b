//! Converts the upstream Gemini SSE (cumulative-parts semantics) into
//! incremental OpenAI chunk objects.
//!
//! The upstream protocol re-sends every previously seen part with each new
//! frame. Function-call parts sit at stable array positions, so dedup is by
//! position; text parts are passed through as-is (upstream does not repeat
//! identical text at the same position in practice, and duplicate text is
//! less harmful than missed text).

use crate::chat::new_call_id;
use bytes::Bytes;
use futures::Stream;
use futures::stream::BoxStream;
use serde_json::{Value, json};
use std::collections::{HashSet, VecDeque};
use std::pin::Pin;
use std::task::{Context, Poll};

type ByteResult = Result<Bytes, Box<dyn std::error::Error + Send + Sync>>;

pub struct GeminiStreamer {
	inner: BoxStream<'static, ByteResult>,
	keep_thinking: bool,

	// -- Set by poll_next
	line_buf: String,
	/// Non-SSE content, retried as raw JSON at end of stream.
	raw_tail: String,
	pending: VecDeque<Value>,
	emitted_fn_positions: HashSet<usize>,
	tool_call_index: u64,
	done: bool,
}

impl GeminiStreamer {
	pub fn new<S>(inner: S, keep_thinking: bool) -> Self
	where
		S: Stream<Item = ByteResult> + Send + 'static,
	{
		Self {
			inner: Box::pin(inner),
			keep_thinking,
			line_buf: String::new(),
			raw_tail: String::new(),
			pending: VecDeque::new(),
			emitted_fn_positions: HashSet::new(),
			tool_call_index: 0,
			done: false,
		}
	}

	pub fn from_response(response: reqwest::Response, keep_thinking: bool) -> Self {
		use futures::TryStreamExt;
		let bytes_stream = response
			.bytes_stream()
			.map_err(|err| Box::new(err) as Box<dyn std::error::Error + Send + Sync>);
		Self::new(bytes_stream, keep_thinking)
	}
}

// region:    --- Stream Impl

impl Stream for GeminiStreamer {
	type Item = Value;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		let this = self.get_mut();

		loop {
			if let Some(chunk) = this.pending.pop_front() {
				return Poll::Ready(Some(chunk));
			}
			if this.done {
				return Poll::Ready(None);
			}

			match this.inner.as_mut().poll_next(cx) {
				Poll::Ready(Some(Ok(bytes))) => {
					this.line_buf.push_str(&String::from_utf8_lossy(&bytes));
					this.drain_lines();
				}
				Poll::Ready(Some(Err(err))) => {
					tracing::warn!("upstream stream read error: {err}");
					this.pending.push_back(json!({
						"choices": [{
							"index": 0,
							"delta": {"content": format!("\n\nStream error: {err}")},
							"finish_reason": "stop",
						}]
					}));
					this.done = true;
				}
				Poll::Ready(None) => {
					this.finish();
					this.done = true;
				}
				Poll::Pending => return Poll::Pending,
			}
		}
	}
}

// endregion: --- Stream Impl

// region:    --- Frame Processing

impl GeminiStreamer {
	fn drain_lines(&mut self) {
		while let Some(pos) = self.line_buf.find('\n') {
			let line: String = self.line_buf.drain(..=pos).collect();
			self.process_line(&line);
		}
	}

	fn process_line(&mut self, line: &str) {
		let line = line.trim();
		if line.is_empty() {
			return;
		}

		if let Some(payload) = line.strip_prefix("data:") {
			let payload = payload.trim();
			// The transformer emits its own terminal chunk.
			if payload == "[DONE]" {
				return;
			}
			match serde_json::from_str::<Value>(payload) {
				Ok(frame) => self.process_frame(&frame),
				Err(err) => tracing::warn!("skipping unparsable SSE data line: {err}"),
			}
		} else {
			self.raw_tail.push_str(line);
			self.raw_tail.push('\n');
		}
	}

	/// End of upstream stream: flush the partial line, retry any non-SSE
	/// remainder as raw JSON (some endpoints answer a plain object or array),
	/// then close with the terminal stop chunk.
	fn finish(&mut self) {
		let rest = std::mem::take(&mut self.line_buf);
		if !rest.trim().is_empty() {
			self.process_line(&rest);
		}

		let tail = std::mem::take(&mut self.raw_tail);
		let tail = tail.trim();
		if !tail.is_empty()
			&& let Ok(value) = serde_json::from_str::<Value>(tail)
		{
			match value {
				Value::Array(frames) => {
					for frame in &frames {
						self.process_frame(frame);
					}
				}
				frame => self.process_frame(&frame),
			}
		}

		self.pending.push_back(json!({
			"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]
		}));
	}

	fn process_frame(&mut self, frame: &Value) {
		// Upstream sometimes nests candidates inside `response`, sometimes not.
		let parts = frame
			.pointer("/response/candidates/0/content/parts")
			.or_else(|| frame.pointer("/candidates/0/content/parts"))
			.and_then(Value::as_array);
		let Some(parts) = parts else { return };

		for (position, part) in parts.iter().enumerate() {
			if let Some(text) = part.get("text").and_then(Value::as_str) {
				let is_thought = part.get("thought").and_then(Value::as_bool).unwrap_or(false);
				if !is_thought || self.keep_thinking {
					self.pending.push_back(json!({
						"choices": [{"index": 0, "delta": {"content": text}, "finish_reason": null}]
					}));
				}
			}

			if let Some(function_call) = part.get("functionCall") {
				if self.emitted_fn_positions.contains(&position) {
					continue;
				}

				let name = function_call.get("name").and_then(Value::as_str).unwrap_or_default();
				let mut args = function_call.get("args").cloned().unwrap_or_else(|| json!({}));
				if let Some(obj) = args.as_object_mut() {
					obj.remove("__thinking_text");
				}

				self.pending.push_back(json!({
					"choices": [{
						"index": 0,
						"delta": {
							"tool_calls": [{
								"index": self.tool_call_index,
								"id": new_call_id(),
								"type": "function",
								"function": {"name": name, "arguments": args.to_string()},
							}]
						},
						"finish_reason": null,
					}]
				}));

				self.emitted_fn_positions.insert(position);
				self.tool_call_index += 1;
			}
		}
	}
}

// endregion: --- Frame Processing
