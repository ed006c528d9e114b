use derive_more::From;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, From)]
pub enum Error {
	// -- Client Request
	MissingAuthorization,
	BadRequest {
		cause: String,
	},

	// -- Upstream
	EmptyUpstreamBody,

	// -- Modules
	#[from]
	Auth(crate::auth::Error),
	#[from]
	Webc(crate::webc::Error),

	// -- Externals
	#[from]
	SerdeJson(serde_json::Error),
	#[from]
	XValue(value_ext::JsonValueExtError),
}

// region:    --- Custom

impl Error {
	pub fn bad_request(cause: impl Into<String>) -> Self {
		Self::BadRequest { cause: cause.into() }
	}
}

// endregion: --- Custom

// region:    --- Error Boilerplate

impl core::fmt::Display for Error {
	fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
		write!(fmt, "{self:?}")
	}
}

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
