//! Thread-safe in-memory [`TokenStore`].

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenFamily, TokenRecord},
	store::{StoreFuture, StoreKey, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, TokenRecord>>>;

/// Process-lifetime token cache.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of cached records.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl TokenStore for MemoryStore {
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		self.0.write().insert(StoreKey::of(&record), record);

		Box::pin(async {})
	}

	fn fetch<'a>(
		&'a self,
		family: &'a TokenFamily,
		scope: &'a ScopeSet,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		let found = self.0.read().get(&StoreKey::new(family, scope)).cloned();

		Box::pin(async move { found })
	}

	fn evict_stale<'a>(&'a self, stale: &'a TokenRecord) -> StoreFuture<'a, bool> {
		let key = StoreKey::of(stale);
		let mut map = self.0.write();
		// Same issuance instants mean the entry is still the record the caller inspected.
		let unchanged = map.get(&key).is_some_and(|current| {
			current.issued_at == stale.issued_at && current.expires_at == stale.expires_at
		});

		if unchanged {
			map.remove(&key);
		}

		drop(map);

		Box::pin(async move { unchanged })
	}
}
