//! Per-credential OAuth orchestration: access-token cache, fingerprint
//! derivation, and project discovery.

// region:    --- Modules

mod error;
mod fingerprint;
mod token_cache;

pub use error::{Error, Result};
pub use fingerprint::*;
pub use token_cache::*;

// endregion: --- Modules
