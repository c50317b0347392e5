//! Access token handed back to endpoint callers.

// self
use crate::{_prelude::*, auth::SecretString};

/// Result of a successful token acquisition: the bearer token and its absolute expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
	/// Bearer token; callers must avoid logging it.
	pub access_token: SecretString,
	/// Absolute expiry instant.
	pub expires_on: OffsetDateTime,
}
impl AccessToken {
	/// Pairs a token with its expiry.
	pub fn new(access_token: impl Into<SecretString>, expires_on: OffsetDateTime) -> Self {
		Self { access_token: access_token.into(), expires_on }
	}

	/// Expiry expressed as whole Unix seconds.
	pub fn expires_on_unix(&self) -> i64 {
		self.expires_on.unix_timestamp()
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("access_token", &"<redacted>")
			.field("expires_on", &self.expires_on)
			.finish()
	}
}
