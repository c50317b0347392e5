//! Local managed-identity endpoint.
//!
//! One route, `/oauth2/v2.0/token`, answering `GET` and `POST`. Each request is validated
//! (see [`validate_request`]) and, only once the caller proved it knows the shared secret,
//! handed to the [`TokenBroker`]. Validation failures are `400 text/plain`; acquisition
//! failures are `500 text/plain` so polling clients always get a body back. A back-off hint
//! from the identity provider is passed on as `Retry-After`.

mod announce;
mod response;
mod validate;

pub use announce::*;
pub use response::*;
pub use validate::*;

// std
use std::net::{Ipv4Addr, SocketAddr};
// crates.io
use axum::{
	Router,
	extract::{RawQuery, State},
	http::{
		HeaderMap, HeaderValue, StatusCode,
		header::{CONTENT_TYPE, RETRY_AFTER},
	},
	response::{IntoResponse, Response},
	routing::get,
};
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	broker::{AcquisitionError, TokenBroker},
	secret::SharedSecret,
};

/// Path served by the endpoint.
pub const TOKEN_ROUTE: &str = "/oauth2/v2.0/token";

/// Listener failures. Both are fatal for the process.
#[derive(Debug, ThisError)]
pub enum EndpointError {
	/// Loopback listener could not be bound.
	#[error("Failed to bind the local endpoint listener.")]
	Bind {
		/// Underlying socket failure.
		#[source]
		source: std::io::Error,
	},
	/// Accept loop stopped with an error.
	#[error("Local endpoint stopped serving.")]
	Serve {
		/// Underlying socket failure.
		#[source]
		source: std::io::Error,
	},
}

/// State shared by every request handler. Read-only after startup.
#[derive(Clone, Debug)]
pub struct EndpointState {
	/// Secret callers must present.
	pub secret: Arc<SharedSecret>,
	/// Broker acquiring tokens for validated requests.
	pub broker: TokenBroker,
}

/// Builds the router serving [`TOKEN_ROUTE`].
pub fn router(state: EndpointState) -> Router {
	Router::new().route(TOKEN_ROUTE, get(issue_token).post(issue_token)).with_state(state)
}

async fn issue_token(
	State(state): State<EndpointState>,
	RawQuery(query): RawQuery,
	headers: HeaderMap,
) -> Response {
	let request = match validate_request(&headers, query.as_deref(), &state.secret) {
		Ok(request) => request,
		Err(err) => {
			tracing::info!(reason = %err, "request rejected");

			return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
		},
	};
	let token = match state.broker.acquire(&request).await {
		Ok(token) => token,
		Err(err) => return acquisition_failure(&err),
	};

	match TokenResponse::from(&token).to_json() {
		Ok(body) => (StatusCode::OK, [(CONTENT_TYPE, "application/json")], body).into_response(),
		Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("TokenAcquisitionError: {err}"))
			.into_response(),
	}
}

fn acquisition_failure(err: &AcquisitionError) -> Response {
	let mut response = (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();

	if let Some(secs) = err.retry_after().map(|hint| hint.whole_seconds()).filter(|secs| *secs > 0)
	{
		response.headers_mut().insert(RETRY_AFTER, HeaderValue::from(secs));
	}

	response
}

/// Bound but not yet serving endpoint.
///
/// Binding and serving are split so the caller can print the announcement (which needs the
/// port) before the accept loop starts.
#[derive(Debug)]
pub struct BrokerEndpoint {
	listener: TcpListener,
	local_addr: SocketAddr,
	state: EndpointState,
}
impl BrokerEndpoint {
	/// Binds an ephemeral port on the IPv4 loopback interface.
	pub async fn bind(state: EndpointState) -> Result<Self, EndpointError> {
		let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
			.await
			.map_err(|source| EndpointError::Bind { source })?;
		let local_addr = listener.local_addr().map_err(|source| EndpointError::Bind { source })?;

		tracing::info!(%local_addr, "endpoint bound");

		Ok(Self { listener, local_addr, state })
	}

	/// Address the listener is bound to.
	pub fn local_addr(&self) -> SocketAddr {
		self.local_addr
	}

	/// Token URL callers should use.
	pub fn token_url(&self) -> String {
		format!("http://{}{TOKEN_ROUTE}", self.local_addr)
	}

	/// Environment assignments for `shell`.
	pub fn announcement(&self, shell: Shell) -> Announcement {
		Announcement {
			shell,
			endpoint: self.token_url(),
			secret: self.state.secret.expose().to_owned(),
		}
	}

	/// Serves until the process is killed.
	pub async fn serve(self) -> Result<(), EndpointError> {
		self.serve_with_shutdown(std::future::pending()).await
	}

	/// Serves until `signal` resolves, then drains in-flight requests.
	pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<(), EndpointError>
	where
		F: 'static + Send + Future<Output = ()>,
	{
		axum::serve(self.listener, router(self.state))
			.with_graceful_shutdown(signal)
			.await
			.map_err(|source| EndpointError::Serve { source })
	}
}
