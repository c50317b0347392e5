//! Client credentials exchange with per-scope coalescing.
//!
//! Every call reaches the token endpoint unless another caller finished an exchange for the
//! same scope set while this one was waiting on the per-key guard. In that case the record the
//! other caller stored is reused.

// crates.io
use tracing::Instrument;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenRecord},
	error::ConfigError,
	flows::ConfidentialClient,
	http::TokenHttpClient,
	oauth::{CredentialExchange, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome},
	store::StoreKey,
};

impl<C, M> ConfidentialClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges the client secret for a token covering `scope` and caches the result.
	pub async fn client_credentials(&self, scope: &ScopeSet) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::ClientCredentials;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = async {
			let secret = self.client_secret.as_ref().ok_or(ConfigError::MissingClientSecret)?;
			let started = OffsetDateTime::now_utc();
			let lease = self.flow_guard(&StoreKey::new(&self.family, scope));
			let _singleflight = lease.mutex.lock().await;

			if let Some(record) = self
				.store
				.fetch(&self.family, scope)
				.await
				.filter(|record| record.issued_at >= started && record.is_active())
			{
				tracing::debug!("reusing token from a concurrent exchange");

				return Ok(record);
			}

			let record = CredentialExchange::new(
				&self.descriptor,
				&self.family.client,
				secret.expose(),
				self.http_client.as_ref(),
				self.transport_mapper.as_ref(),
				self.strategy.as_ref(),
			)?
			.exchange(self.family.clone(), scope)
			.await?;

			self.store.save(record.clone()).await;

			tracing::info!(expires_at = %record.expires_at, "token issued");

			Ok(record)
		}
		.instrument(obs::flow_span(KIND, "client_credentials"))
		.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(err) => {
				tracing::warn!(error = %err, "client credentials exchange failed");
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}
}
