//! Upstream web client: endpoint failover, capacity backoff, and the
//! randomized wire-profile headers.

// region:    --- Modules

mod error;
mod headers;
mod upstream;

pub use error::{Error, Result};
pub use headers::*;
pub use upstream::*;

// endregion: --- Modules
