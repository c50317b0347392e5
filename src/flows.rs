//! Confidential client: the identity-provider collaborator behind the token broker.
//!
//! [`ConfidentialClient`] owns the transport, token cache, descriptor, and the development
//! identity (tenant, application, secret). It offers two acquisition paths that mirror what
//! the broker needs: [`acquire_silent`](ConfidentialClient::acquire_silent) reads only the
//! cache, [`client_credentials`](ConfidentialClient::client_credentials) always talks to the
//! token endpoint and refills the cache.

pub mod common;

mod client_credentials;
mod silent;

pub use common::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, SecretString, TenantId, TokenFamily},
	broker::{TokenFuture, TokenSource},
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{ReqwestTransportErrorMapper, TransportErrorMapper},
	provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
	store::{MemoryStore, StoreKey, TokenStore},
};

type FlowGuards = Mutex<HashMap<StoreKey, FlowGuardSlot>>;

/// Client-credentials identity bound to one tenant and application.
///
/// Safe for concurrent use: the cache is internally locked and exchanges for the same scope
/// set are serialized by a per-key async mutex.
#[derive(Clone)]
pub struct ConfidentialClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every token endpoint request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Token cache consulted by silent acquisitions.
	pub store: Arc<dyn TokenStore>,
	/// Token endpoint descriptor.
	pub descriptor: ProviderDescriptor,
	/// Strategy classifying token endpoint failures.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Tenant + application the tokens are issued to.
	pub family: TokenFamily,
	/// Client secret presented to the token endpoint.
	pub client_secret: Option<SecretString>,
	/// Cache freshness policy applied by silent acquisitions.
	pub policy: CachePolicy,
	flow_guards: Arc<FlowGuards>,
}
impl<C, M> ConfidentialClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn TokenStore>,
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		tenant: TenantId,
		client_id: ClientId,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			descriptor,
			strategy,
			family: TokenFamily::new(tenant, client_id),
			client_secret: None,
			policy: CachePolicy::default(),
			flow_guards: Default::default(),
		}
	}

	/// Sets or replaces the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(SecretString::new(secret));

		self
	}

	/// Overrides the cache freshness policy.
	pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
		self.policy = policy;

		self
	}

	/// Leases (and creates on demand) the guard serializing exchanges for a store key.
	fn flow_guard(&self, key: &StoreKey) -> FlowGuardLease<'_> {
		let mut guards = self.flow_guards.lock();
		let slot = guards.entry(key.clone()).or_default();

		slot.leases += 1;

		FlowGuardLease { guards: &self.flow_guards, key: key.clone(), mutex: slot.mutex.clone() }
	}
}
impl ConfidentialClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client with its own reqwest transport, in-memory cache, and the default
	/// strategy.
	pub fn new(
		descriptor: ProviderDescriptor,
		tenant: TenantId,
		client_id: ClientId,
		client_secret: impl Into<String>,
	) -> Result<Self> {
		let client = Self::with_http_client(
			Arc::new(MemoryStore::default()),
			descriptor,
			Arc::new(DefaultProviderStrategy),
			tenant,
			client_id,
			ReqwestHttpClient::new()?,
			ReqwestTransportErrorMapper,
		);

		Ok(client.with_client_secret(client_secret))
	}
}
impl<C, M> TokenSource for ConfidentialClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn acquire_token_silent<'a>(&'a self, scope: &'a ScopeSet) -> TokenFuture<'a> {
		Box::pin(async move { Ok(self.acquire_silent(scope).await?.to_access_token()) })
	}

	fn acquire_token_by_credential<'a>(&'a self, scope: &'a ScopeSet) -> TokenFuture<'a> {
		Box::pin(async move { Ok(self.client_credentials(scope).await?.to_access_token()) })
	}
}

#[derive(Default)]
struct FlowGuardSlot {
	mutex: Arc<AsyncMutex<()>>,
	leases: usize,
}

/// Shared handle on a per-key exchange guard.
///
/// The map entry is removed when the last lease for its key is dropped.
struct FlowGuardLease<'a> {
	guards: &'a FlowGuards,
	key: StoreKey,
	mutex: Arc<AsyncMutex<()>>,
}
impl Drop for FlowGuardLease<'_> {
	fn drop(&mut self) {
		let mut guards = self.guards.lock();
		let Some(slot) = guards.get_mut(&self.key) else { return };

		slot.leases = slot.leases.saturating_sub(1);

		if slot.leases == 0 {
			guards.remove(&self.key);
		}
	}
}

impl<C, M> Debug for ConfidentialClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConfidentialClient")
			.field("descriptor", &self.descriptor)
			.field("family", &self.family)
			.field("client_secret_set", &self.client_secret.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{build_reqwest_test_client, test_descriptor};

	#[test]
	fn flow_guards_are_released_with_their_last_lease() {
		let (client, _) = build_reqwest_test_client(
			test_descriptor("https://login.example.com/contoso/oauth2/v2.0/token"),
			"contoso",
			"dev-app",
			"dev-secret",
		);
		let scope =
			ScopeSet::for_resource("https://vault.azure.net").expect("Scope should be valid.");
		let key = StoreKey::new(&client.family, &scope);
		let first = client.flow_guard(&key);
		let second = client.flow_guard(&key);

		assert!(Arc::ptr_eq(&first.mutex, &second.mutex));
		assert_eq!(client.flow_guards.lock().len(), 1);

		drop(first);

		assert_eq!(client.flow_guards.lock().len(), 1, "A lease is still outstanding.");

		drop(second);

		assert!(client.flow_guards.lock().is_empty());

		let third = client.flow_guard(&key);

		assert_eq!(client.flow_guards.lock().len(), 1);

		drop(third);

		assert!(client.flow_guards.lock().is_empty());
	}
}
