// region:    --- Modules

mod error;

pub mod auth;
pub mod chat;
pub mod config;
pub mod gemini;
pub mod server;
pub mod webc;

pub use error::{Error, Result};

// endregion: --- Modules
