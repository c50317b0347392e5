//! `msi-broker` binary.

// crates.io
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
// self
use msi_broker::{app, config::Cli, obs};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let cli = Cli::parse();

	obs::init_tracing(&cli.log).wrap_err("failed to initialize logging")?;

	let settings = cli.into_settings().wrap_err("invalid configuration")?;

	app::run(settings, async {
		if let Err(err) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %err, "failed to listen for ctrl-c");
			std::future::pending::<()>().await;
		}
	})
	.await
	.wrap_err("broker terminated")
}
