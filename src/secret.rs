//! Per-process shared secret that local callers must echo back in the `secret` header.
//!
//! The real metadata service relies on network isolation; locally any process can reach the
//! listener, so each run mints a fresh random value and announces it once on stdout.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::CryptoRng;
use subtle::ConstantTimeEq;
// self
use crate::_prelude::*;

/// Number of random bytes behind a [`SharedSecret`] (128 bits).
pub const SHARED_SECRET_LEN: usize = 16;

/// URL-safe random token authenticating local callers.
#[derive(Clone)]
pub struct SharedSecret(String);
impl SharedSecret {
	/// Draws a new secret from `rng`.
	///
	/// The generator is passed in explicitly; the binary seeds one `StdRng` from the OS at
	/// startup and uses it only here.
	pub fn generate<R>(rng: &mut R) -> Self
	where
		R: ?Sized + CryptoRng,
	{
		let mut bytes = [0_u8; SHARED_SECRET_LEN];

		rng.fill_bytes(&mut bytes);

		Self(URL_SAFE_NO_PAD.encode(bytes))
	}

	/// Returns true when `candidate` equals the secret byte-for-byte.
	///
	/// The comparison runs in constant time for equal-length inputs.
	pub fn verify(&self, candidate: &str) -> bool {
		self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
	}

	/// Encoded secret, for the startup announcement only.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for SharedSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SharedSecret").field(&"<redacted>").finish()
	}
}
