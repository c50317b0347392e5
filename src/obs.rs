//! Observability helpers: flow spans, outcome counters, and subscriber setup.
//!
//! Spans are named `msi_broker.flow` and carry `flow` and `stage` fields. With the `metrics`
//! feature every attempt/success/failure also increments `msi_broker_flow_total`, labeled by
//! `flow` + `outcome`.

mod metrics;

pub use metrics::*;

// crates.io
use tracing::Span;
use tracing_subscriber::EnvFilter;
// self
use crate::{_prelude::*, error::ConfigError};

/// Token acquisition paths observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Cache-only acquisition.
	Silent,
	/// Client credentials exchange at the token endpoint.
	ClientCredentials,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Silent => "silent",
			FlowKind::ClientCredentials => "client_credentials",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Creates the span wrapping one flow invocation.
pub fn flow_span(kind: FlowKind, stage: &'static str) -> Span {
	tracing::info_span!("msi_broker.flow", flow = kind.as_str(), stage)
}

/// Installs the global `fmt` subscriber writing to stderr.
///
/// Stdout is reserved for the startup announcement, so log output never goes there.
pub fn init_tracing(directive: &str) -> Result<(), ConfigError> {
	let filter = EnvFilter::try_new(directive)
		.map_err(|source| ConfigError::LogFilter { directive: directive.to_owned(), source })?;

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init()
		.map_err(|source| ConfigError::TracingInit { source })
}
