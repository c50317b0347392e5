//! Token cache contract and the in-process implementation.
//!
//! Nothing here outlives the process: the broker is a development tool and a restart simply
//! starts with an empty cache.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenFamily, TokenRecord},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Cache backend consulted by silent acquisitions and filled by credential exchanges.
///
/// Operations cannot fail: the cache lives in process memory.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the record for its family + scope.
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()>;

	/// Fetches the record associated with the family + scope, if present.
	fn fetch<'a>(
		&'a self,
		family: &'a TokenFamily,
		scope: &'a ScopeSet,
	) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Drops `stale` only if it is still the cached record for its family + scope.
	///
	/// A record saved after `stale` was read stays in place. Returns whether anything was
	/// removed.
	fn evict_stale<'a>(&'a self, stale: &'a TokenRecord) -> StoreFuture<'a, bool>;
}

/// Unique key identifying a cached token record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoreKey {
	/// Identity component.
	pub family: TokenFamily,
	/// Scope fingerprint used for partitioning.
	pub scope_fingerprint: String,
}
impl StoreKey {
	/// Builds a key using the provided family and scope fingerprint.
	pub fn new(family: &TokenFamily, scope: &ScopeSet) -> Self {
		Self { family: family.clone(), scope_fingerprint: scope.fingerprint() }
	}

	/// Key a record is cached under.
	pub fn of(record: &TokenRecord) -> Self {
		Self::new(&record.family, &record.scope)
	}
}
