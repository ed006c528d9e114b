pub type Result<T> = core::result::Result<T, Error>;

/// Failure taxonomy of the token refresh / project discovery paths.
///
/// Clone because in-flight refresh results are shared across awaiting
/// requests (single-flight).
#[derive(Debug, Clone)]
pub enum Error {
	// -- Token Refresh
	/// 400/401 from the token endpoint; the cache entry is evicted.
	InvalidToken {
		status: u16,
		body: String,
	},
	/// 429 from the token endpoint; the cache entry is kept for retry.
	RateLimit {
		status: u16,
		body: String,
	},
	/// Transport failure or any other non-2xx; the cache entry is kept.
	Network {
		cause: String,
	},
}

// region:    --- Error Boilerplate

impl core::fmt::Display for Error {
	fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
		write!(fmt, "{self:?}")
	}
}

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
