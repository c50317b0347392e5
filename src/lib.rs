//! Local managed-identity endpoint: authenticates callers with a per-process shared secret,
//! turns `resource` requests into `.default` scopes, and brokers client-credential tokens with a
//! cache-first, exchange-on-miss policy.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod app;
pub mod auth;
pub mod broker;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod secret;
pub mod store;
#[cfg(any(test, feature = "test"))]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{ClientId, TenantId},
		flows::ConfidentialClient,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
		store::{MemoryStore, TokenStore},
	};

	/// Confidential client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = ConfidentialClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a token endpoint descriptor pointing at a mock server URL.
	pub fn test_descriptor(token_endpoint: &str) -> ProviderDescriptor {
		ProviderDescriptor::builder()
			.token_endpoint(
				Url::parse(token_endpoint).expect("Mock token endpoint should parse successfully."),
			)
			.build()
			.expect("Mock provider descriptor should build successfully.")
	}

	/// Constructs a [`ConfidentialClient`] backed by an in-memory store, the default provider
	/// strategy, and the reqwest transport used across integration tests.
	pub fn build_reqwest_test_client(
		descriptor: ProviderDescriptor,
		tenant: &str,
		client_id: &str,
		client_secret: &str,
	) -> (ReqwestTestClient, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let strategy: Arc<dyn ProviderStrategy> = Arc::new(DefaultProviderStrategy);
		let tenant = TenantId::new(tenant).expect("Tenant fixture should be valid.");
		let client_id = ClientId::new(client_id).expect("Client fixture should be valid.");
		let client = ConfidentialClient::with_http_client(
			store,
			descriptor,
			strategy,
			tenant,
			client_id,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.with_client_secret(client_secret);

		(client, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{HashMap, hash_map::DefaultHasher},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::{Hash, Hasher},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
// The binary reports fatal startup errors through color-eyre.
use color_eyre as _;
#[cfg(test)] use httpmock as _;
