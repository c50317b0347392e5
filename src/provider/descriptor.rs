//! Token endpoint descriptor for the Microsoft identity platform (or a compatible mock).

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, auth::TenantId, error::ConfigError};

/// Public-cloud authority host used when none is configured.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com/";

/// Immutable descriptor consumed by the confidential client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderDescriptor {
	/// v2.0 token endpoint for the tenant.
	pub token_endpoint: Url,
}
impl ProviderDescriptor {
	/// Creates a new builder.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new()
	}

	/// Builds the descriptor for `tenant` under `authority_host`.
	///
	/// The token endpoint is `<authority_host>/<tenant>/oauth2/v2.0/token`; a missing trailing
	/// slash on the host is tolerated.
	pub fn entra(authority_host: &str, tenant: &TenantId) -> Result<Self> {
		let token_endpoint = token_endpoint(authority_host, tenant)?;

		Self::builder()
			.token_endpoint(token_endpoint)
			.build()
			.map_err(|err| ConfigError::from(err).into())
	}
}

fn token_endpoint(authority_host: &str, tenant: &TenantId) -> Result<Url, ConfigError> {
	let invalid =
		|source| ConfigError::InvalidAuthorityHost { host: authority_host.to_owned(), source };
	let mut host = Url::parse(authority_host).map_err(invalid)?;

	if !host.path().ends_with('/') {
		let path = format!("{}/", host.path());

		host.set_path(&path);
	}

	host.join(&format!("{tenant}/oauth2/v2.0/token")).map_err(invalid)
}
