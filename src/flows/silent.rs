//! Cache-only acquisition.
//!
//! A silent acquisition never talks to the token endpoint. A fresh record is returned as-is; a
//! stale one is evicted so the next exchange starts from a clean slot, unless another request
//! already replaced it.

// crates.io
use tracing::Instrument;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenRecord},
	flows::ConfidentialClient,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome},
};

impl<C, M> ConfidentialClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a cached token for `scope`, or [`Error::CacheMiss`] when none is usable.
	pub async fn acquire_silent(&self, scope: &ScopeSet) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::Silent;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = async {
			let now = OffsetDateTime::now_utc();

			match self.store.fetch(&self.family, scope).await {
				Some(record) if self.policy.is_fresh(&record, now) => {
					tracing::debug!(expires_at = %record.expires_at, "cache hit");

					return Ok(record);
				},
				Some(stale) => {
					let evicted = self.store.evict_stale(&stale).await;

					tracing::debug!(evicted, "cached token is inside the preemptive window");
				},
				None => tracing::debug!("cache miss"),
			}

			Err(Error::CacheMiss { scope: scope.normalized() })
		}
		.instrument(obs::flow_span(KIND, "acquire_silent"))
		.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
