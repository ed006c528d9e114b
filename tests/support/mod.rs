#![allow(unused)] // For test support
//! Shared utilities for the integration tests.
//! Note: Must be imported in each test file.

use agproxy::gemini::GeminiStreamer;
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;

pub type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>;

type ByteResult = core::result::Result<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// Builds a transformer over a fixed sequence of upstream byte frames.
pub fn streamer_from_frames(frames: &[&str], keep_thinking: bool) -> GeminiStreamer {
	let items: Vec<ByteResult> = frames.iter().map(|f| Ok(Bytes::from(f.to_string()))).collect();
	GeminiStreamer::new(futures::stream::iter(items), keep_thinking)
}

/// Builds a transformer whose upstream fails after the given frames.
pub fn streamer_with_error(frames: &[&str], error: &str, keep_thinking: bool) -> GeminiStreamer {
	let mut items: Vec<ByteResult> = frames.iter().map(|f| Ok(Bytes::from(f.to_string()))).collect();
	items.push(Err(std::io::Error::other(error.to_string()).into()));
	GeminiStreamer::new(futures::stream::iter(items), keep_thinking)
}

pub async fn collect_chunks(mut streamer: GeminiStreamer) -> Vec<Value> {
	let mut chunks = Vec::new();
	while let Some(chunk) = streamer.next().await {
		chunks.push(chunk);
	}
	chunks
}

pub fn delta_content(chunk: &Value) -> Option<&str> {
	chunk.pointer("/choices/0/delta/content").and_then(Value::as_str)
}

pub fn finish_reason(chunk: &Value) -> Option<&str> {
	chunk.pointer("/choices/0/finish_reason").and_then(Value::as_str)
}
