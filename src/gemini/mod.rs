//! Gemini-side translation: schema sanitizing, message/tool translation,
//! reasoning mapping, and the cumulative-to-incremental stream transformer.

// region:    --- Modules

mod reasoning;
mod schema;
mod streamer;
mod translate;

pub use reasoning::*;
pub use schema::*;
pub use streamer::*;
pub use translate::*;

// endregion: --- Modules

/// Sentinel accepted by the upstream thought-signature validator.
///
/// The proxy is stateless across requests, so it cannot round-trip the real
/// per-thought signatures; upstream accepts this constant under its
/// permissive validator.
pub const SKIP_THOUGHT_SIGNATURE: &str = "skip_thought_signature_validator";
