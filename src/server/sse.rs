//! Client-side SSE framing of the transformer output, and the non-streaming
//! accumulation path.

use crate::chat::{CompletionAccumulator, enrich_chunk};
use crate::gemini::GeminiStreamer;
use axum::body::Body;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;

/// Wraps each transformer chunk as a `data: <json>\n\n` frame, with the
/// terminal `data: [DONE]` sentinel after the final stop chunk.
pub fn sse_response(streamer: GeminiStreamer, id: String, created: u64, model: String) -> Response {
	let frames = streamer
		.map(move |mut chunk| {
			enrich_chunk(&mut chunk, &id, created, &model);
			Ok::<Bytes, std::convert::Infallible>(Bytes::from(format!("data: {chunk}\n\n")))
		})
		.chain(futures::stream::iter([Ok(Bytes::from_static(b"data: [DONE]\n\n"))]));

	(
		[
			(header::CONTENT_TYPE, "text/event-stream"),
			(header::CACHE_CONTROL, "no-cache"),
			(header::CONNECTION, "keep-alive"),
		],
		Body::from_stream(frames),
	)
		.into_response()
}

/// Drains the transformer into a single completion object.
pub async fn accumulate_completion(mut streamer: GeminiStreamer, id: &str, created: u64, model: &str) -> Value {
	let mut accumulator = CompletionAccumulator::default();
	while let Some(chunk) = streamer.next().await {
		accumulator.push_chunk(&chunk);
	}
	accumulator.into_completion(id, created, model)
}
