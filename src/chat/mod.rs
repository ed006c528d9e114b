//! OpenAI wire forms: the request shapes the proxy accepts, and the
//! chunk/completion shapes it emits back to clients.

// region:    --- Modules

mod chat_req;
mod chat_res;

pub use chat_req::*;
pub use chat_res::*;

// endregion: --- Modules
