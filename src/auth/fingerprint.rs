use sha2::{Digest, Sha256};

/// Stable per-credential header pair sent upstream with the antigravity
/// style (`X-Goog-QuotaUser` / `X-Client-Device-Id`).
#[derive(Debug, Clone)]
pub struct Fingerprint {
	pub quota_user: String,
	pub device_id: String,
}

/// Derives the fingerprint from a refresh token: hex of the first 8 bytes of
/// its SHA-256, with the device id right-padded to 32 chars.
pub fn derive_fingerprint(refresh_token: &str) -> Fingerprint {
	let digest = Sha256::digest(refresh_token.as_bytes());
	let quota_user: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
	let device_id = format!("{quota_user:0<32}");
	Fingerprint { quota_user, device_id }
}

// region:    --- Tests


// endregion: --- Tests
