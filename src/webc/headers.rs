//! Wire styles and their randomized header profiles.
//!
//! Antigravity and gemini-cli are two header profiles over the same upstream
//! API; each request picks one profile uniformly at random from the style's
//! fixed pool.

// region:    --- HeaderStyle

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStyle {
	Antigravity,
	GeminiCli,
}

// endregion: --- HeaderStyle

// region:    --- Profiles

#[derive(Debug, Clone, Copy)]
pub struct HeaderProfile {
	pub user_agent: &'static str,
	pub api_client: &'static str,
	pub client_metadata: &'static str,
}

const ANTIGRAVITY_PROFILES: &[HeaderProfile] = &[
	HeaderProfile {
		user_agent: "antigravity/1.104.0 darwin/arm64",
		api_client: "antigravity/1.104.0",
		client_metadata: r#"{"ideType":"IDE_UNSPECIFIED","platform":"DARWIN_ARM64","pluginType":"GEMINI"}"#,
	},
	HeaderProfile {
		user_agent: "antigravity/1.104.0 darwin/x64",
		api_client: "antigravity/1.104.0",
		client_metadata: r#"{"ideType":"IDE_UNSPECIFIED","platform":"DARWIN_AMD64","pluginType":"GEMINI"}"#,
	},
	HeaderProfile {
		user_agent: "antigravity/1.104.0 linux/x64",
		api_client: "antigravity/1.104.0",
		client_metadata: r#"{"ideType":"IDE_UNSPECIFIED","platform":"LINUX_AMD64","pluginType":"GEMINI"}"#,
	},
	HeaderProfile {
		user_agent: "antigravity/1.104.0 linux/arm64",
		api_client: "antigravity/1.104.0",
		client_metadata: r#"{"ideType":"IDE_UNSPECIFIED","platform":"LINUX_ARM64","pluginType":"GEMINI"}"#,
	},
	HeaderProfile {
		user_agent: "antigravity/1.104.0 win32/x64",
		api_client: "antigravity/1.104.0",
		client_metadata: r#"{"ideType":"IDE_UNSPECIFIED","platform":"WINDOWS_AMD64","pluginType":"GEMINI"}"#,
	},
];

const GEMINI_CLI_PROFILES: &[HeaderProfile] = &[
	HeaderProfile {
		user_agent: "GeminiCLI/0.9.0 (linux; x64) node/22.12.0",
		api_client: "gl-node/22.12.0",
		client_metadata: r#"{"ideType":"IDE_UNSPECIFIED","platform":"LINUX_AMD64","pluginType":"GEMINI"}"#,
	},
	HeaderProfile {
		user_agent: "GeminiCLI/0.9.0 (darwin; arm64) node/20.18.1",
		api_client: "gl-node/20.18.1",
		client_metadata: r#"{"ideType":"IDE_UNSPECIFIED","platform":"DARWIN_ARM64","pluginType":"GEMINI"}"#,
	},
	HeaderProfile {
		user_agent: "google-api-nodejs-client/9.15.1",
		api_client: "gl-node/22.12.0",
		client_metadata: r#"{"ideType":"IDE_UNSPECIFIED","platform":"PLATFORM_UNSPECIFIED","pluginType":"GEMINI"}"#,
	},
];

pub fn pick_profile(style: HeaderStyle) -> &'static HeaderProfile {
	let pool = match style {
		HeaderStyle::Antigravity => ANTIGRAVITY_PROFILES,
		HeaderStyle::GeminiCli => GEMINI_CLI_PROFILES,
	};
	&pool[fastrand::usize(..pool.len())]
}

// endregion: --- Profiles

// region:    --- Tests

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_pick_profile_stays_in_pool() {
		for _ in 0..50 {
			let profile = pick_profile(HeaderStyle::Antigravity);
			assert!(profile.user_agent.starts_with("antigravity/"));
			let profile = pick_profile(HeaderStyle::GeminiCli);
			assert!(!profile.user_agent.starts_with("antigravity/"));
		}
	}
}

// endregion: --- Tests
