//! Token broker: cache-first acquisition with a single credential fallback.
//!
//! The broker knows nothing about OAuth. It drives a [`TokenSource`] through two steps:
//! a silent attempt, then (on any failure) exactly one credential exchange for the same scope
//! set. There are no retries beyond that; a source that wants retries does them itself.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ScopeSet},
	endpoint::AuthRequest,
};

/// Boxed future returned by [`TokenSource`] operations.
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<AccessToken>> + 'a + Send>>;

/// Identity-provider client consumed by the broker.
///
/// The `Send + Sync` bound is the contract that one instance may be shared by every
/// concurrent request handler without outside locking.
pub trait TokenSource
where
	Self: Send + Sync,
{
	/// Returns a token from local state only; fails fast when nothing usable is cached.
	fn acquire_token_silent<'a>(&'a self, scope: &'a ScopeSet) -> TokenFuture<'a>;

	/// Performs a full credential exchange with the identity provider.
	fn acquire_token_by_credential<'a>(&'a self, scope: &'a ScopeSet) -> TokenFuture<'a>;
}

/// Both acquisition paths failed; carries the fallback's error.
#[derive(Debug, ThisError)]
#[error("TokenAcquisitionError: {source}")]
pub struct AcquisitionError {
	/// Failure reported by the credential exchange.
	#[source]
	pub source: Error,
}
impl AcquisitionError {
	/// Back-off hint the identity provider attached to a temporary failure.
	pub fn retry_after(&self) -> Option<Duration> {
		match &self.source {
			Error::Transient(err) => err.retry_after(),
			_ => None,
		}
	}
}

/// Cheaply cloneable handle shared by every endpoint handler.
#[derive(Clone)]
pub struct TokenBroker {
	source: Arc<dyn TokenSource>,
}
impl TokenBroker {
	/// Wraps a token source.
	pub fn new(source: Arc<dyn TokenSource>) -> Self {
		Self { source }
	}

	/// Acquires a token for the request's scope set.
	pub async fn acquire(&self, request: &AuthRequest) -> Result<AccessToken, AcquisitionError> {
		let scope = &request.scope;

		match self.source.acquire_token_silent(scope).await {
			Ok(token) => return Ok(token),
			Err(err) => tracing::debug!(scope = %scope, reason = %err, "silent acquisition failed"),
		}

		self.source.acquire_token_by_credential(scope).await.map_err(|source| {
			tracing::warn!(scope = %scope, error = %source, "token acquisition failed");

			AcquisitionError { source }
		})
	}
}
impl Debug for TokenBroker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenBroker").finish_non_exhaustive()
	}
}
