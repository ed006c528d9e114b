use derive_more::From;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, From)]
pub enum Error {
	/// Last non-2xx answer once every endpoint (and style) was exhausted.
	UpstreamStatus {
		status: u16,
		body: String,
	},
	NoEndpoints,

	// -- Externals
	#[from]
	Reqwest(reqwest::Error),
}

// region:    --- Error Boilerplate

impl core::fmt::Display for Error {
	fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
		write!(fmt, "{self:?}")
	}
}

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
