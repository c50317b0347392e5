//! Process bootstrap: wires settings into a running endpoint.

// crates.io
use rand::{SeedableRng, rngs::StdRng};
// self
use crate::{
	_prelude::*,
	broker::TokenBroker,
	config::BrokerSettings,
	endpoint::{BrokerEndpoint, EndpointState},
	flows::{CachePolicy, ConfidentialClient},
	provider::ProviderDescriptor,
	secret::SharedSecret,
};

/// Announcement preamble printed before the environment assignments.
pub const BANNER: &str = "Managed identity endpoint started. To configure your process to \
	authenticate, run the following commands to set up the environment:";

/// Builds every component and binds the listener.
///
/// Any failure here is fatal: without an identity-provider client or a listener the broker
/// cannot serve anything.
pub async fn start(settings: BrokerSettings) -> Result<BrokerEndpoint> {
	let descriptor = ProviderDescriptor::entra(&settings.authority_host, &settings.tenant)?;

	tracing::debug!(token_endpoint = %descriptor.token_endpoint, "identity provider resolved");

	let client = ConfidentialClient::new(
		descriptor,
		settings.tenant,
		settings.client_id,
		settings.client_secret.expose(),
	)?
	.with_cache_policy(CachePolicy::default().with_preemptive_window(settings.refresh_window));
	// Seeded once from the OS and used only for the shared secret.
	let mut rng = StdRng::from_os_rng();
	let state = EndpointState {
		secret: Arc::new(SharedSecret::generate(&mut rng)),
		broker: TokenBroker::new(Arc::new(client)),
	};

	Ok(BrokerEndpoint::bind(state).await?)
}

/// Runs the broker until `shutdown` resolves.
pub async fn run<F>(settings: BrokerSettings, shutdown: F) -> Result<()>
where
	F: 'static + Send + Future<Output = ()>,
{
	let shell = settings.shell;
	let endpoint = start(settings).await?;

	println!("{BANNER}");
	println!();
	println!("{}", endpoint.announcement(shell));

	endpoint.serve_with_shutdown(shutdown).await?;

	tracing::info!("endpoint stopped");

	Ok(())
}
