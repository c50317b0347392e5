//! Command-line configuration for the broker binary.

// crates.io
use clap::Parser;
use time::Duration;
// self
use crate::{
	auth::{ClientId, SecretString, TenantId},
	endpoint::Shell,
	error::ConfigError,
	provider::DEFAULT_AUTHORITY_HOST,
};

/// Emulates the managed-identity token endpoint on a developer machine.
///
/// Tokens are issued to the development application identified by tenant, client and
/// secret. Every value can also come from the environment.
#[derive(Clone, Parser)]
#[command(name = "msi-broker", version, about)]
pub struct Cli {
	/// Directory (tenant) the development application is registered in.
	#[arg(long, env = "AZURE_TENANT_ID")]
	pub tenant_id: String,
	/// Application (client) id of the development identity.
	#[arg(long, env = "AZURE_CLIENT_ID")]
	pub client_id: String,
	/// Client secret of the development identity.
	#[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
	pub client_secret: String,
	/// Identity platform authority host.
	#[arg(long, env = "AZURE_AUTHORITY_HOST", default_value = DEFAULT_AUTHORITY_HOST)]
	pub authority_host: String,
	/// Shell syntax for the printed environment assignments.
	#[arg(long, value_enum, default_value_t = Shell::Cmd)]
	pub shell: Shell,
	/// Seconds before expiry at which a cached token stops being served.
	#[arg(long, env = "MSI_BROKER_REFRESH_WINDOW", default_value_t = 60)]
	pub refresh_window_secs: u32,
	/// Log filter directive written to stderr.
	#[arg(long, env = "RUST_LOG", default_value = "info")]
	pub log: String,
}
impl Cli {
	/// Validates the raw arguments.
	pub fn into_settings(self) -> Result<BrokerSettings, ConfigError> {
		if self.client_secret.is_empty() {
			return Err(ConfigError::MissingClientSecret);
		}

		Ok(BrokerSettings {
			tenant: TenantId::new(&self.tenant_id)?,
			client_id: ClientId::new(&self.client_id)?,
			client_secret: SecretString::new(self.client_secret),
			authority_host: self.authority_host,
			shell: self.shell,
			refresh_window: Duration::seconds(self.refresh_window_secs.into()),
		})
	}
}

/// Validated process settings.
#[derive(Clone, Debug)]
pub struct BrokerSettings {
	/// Tenant of the development identity.
	pub tenant: TenantId,
	/// Application id of the development identity.
	pub client_id: ClientId,
	/// Client secret of the development identity.
	pub client_secret: SecretString,
	/// Authority host the token endpoint is derived from.
	pub authority_host: String,
	/// Shell used for the announcement.
	pub shell: Shell,
	/// Preemptive refresh window applied to cached tokens.
	pub refresh_window: Duration,
}
