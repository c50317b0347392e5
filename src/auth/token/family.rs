//! Identity that owns cached tokens.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, TenantId},
};

/// Tenant/application pair a token was issued to.
///
/// Every cache entry is partitioned by family so a store shared between clients never
/// serves one application's token to another.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokenFamily {
	/// Directory the application is registered in.
	pub tenant: TenantId,
	/// Application (client) identifier.
	pub client: ClientId,
}
impl TokenFamily {
	/// Creates a family for the provided tenant and client.
	pub fn new(tenant: TenantId, client: ClientId) -> Self {
		Self { tenant, client }
	}
}
