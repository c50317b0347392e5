//! JSON body returned to callers on success.

// self
use crate::{_prelude::*, auth::AccessToken};

/// Success body: the bearer token plus its expiry as whole Unix seconds.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Bearer token.
	pub access_token: String,
	/// Expiry instant in Unix seconds.
	pub expires_on: i64,
}
impl TokenResponse {
	/// Renders the body as two-space indented JSON.
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string_pretty(self)
	}
}
impl From<&AccessToken> for TokenResponse {
	fn from(token: &AccessToken) -> Self {
		Self {
			access_token: token.access_token.expose().to_owned(),
			expires_on: token.expires_on_unix(),
		}
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("access_token", &"<redacted>")
			.field("expires_on", &self.expires_on)
			.finish()
	}
}
