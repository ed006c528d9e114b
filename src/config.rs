//! Process configuration, resolved once at startup from environment variables.

// Compiled-in OAuth client (the Cloud Code / Antigravity public client).
const DEFAULT_CLIENT_ID: &str = "681255809395-oo8ft2oprdrnp9e3aqf6av3hmdib135j.apps.googleusercontent.com";
const DEFAULT_CLIENT_SECRET: &str = "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";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_THINKING_BUDGET: u32 = 16000;

#[derive(Debug, Clone)]
pub struct ProxyConfig {
	/// Listening port (`PORT`).
	pub port: u16,

	/// OAuth client credentials for the Google token endpoint
	/// (`ANTIGRAVITY_CLIENT_ID` / `ANTIGRAVITY_CLIENT_SECRET`).
	pub client_id: String,
	pub client_secret: String,

	/// When set, skips the `loadCodeAssist` project discovery (`ANTIGRAVITY_PROJECT_ID`).
	pub project_id: Option<String>,

	/// When true, thinking text parts are passed through to the client (`KEEP_THINKING`).
	pub keep_thinking: bool,

	/// Thinking token budget applied when the request carries no `reasoning_effort` (`THINKING_BUDGET`).
	pub thinking_budget: u32,
}

impl ProxyConfig {
	pub fn from_env() -> Self {
		let port = env_parse("PORT").unwrap_or(DEFAULT_PORT);

		let client_id = env_non_empty("ANTIGRAVITY_CLIENT_ID").unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string());
		let client_secret =
			env_non_empty("ANTIGRAVITY_CLIENT_SECRET").unwrap_or_else(|| DEFAULT_CLIENT_SECRET.to_string());

		let project_id = env_non_empty("ANTIGRAVITY_PROJECT_ID");

		let keep_thinking = std::env::var("KEEP_THINKING").map(|v| v == "true").unwrap_or(false);

		let thinking_budget = env_parse("THINKING_BUDGET").unwrap_or(DEFAULT_THINKING_BUDGET);

		Self {
			port,
			client_id,
			client_secret,
			project_id,
			keep_thinking,
			thinking_budget,
		}
	}
}

impl Default for ProxyConfig {
	fn default() -> Self {
		Self {
			port: DEFAULT_PORT,
			client_id: DEFAULT_CLIENT_ID.to_string(),
			client_secret: DEFAULT_CLIENT_SECRET.to_string(),
			project_id: None,
			keep_thinking: false,
			thinking_budget: DEFAULT_THINKING_BUDGET,
		}
	}
}

// region:    --- Support

fn env_non_empty(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
	std::env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

// endregion: --- Support
