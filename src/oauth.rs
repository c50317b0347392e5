//! Client-credentials exchange on top of the `oauth2` crate.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId as OAuthClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenFamily, TokenRecord, TokenRecordBuilderError},
	error::{ConfigError, TransientError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{ProviderDescriptor, ProviderErrorContext, ProviderErrorKind, ProviderStrategy},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => transient(
				meta,
				format!("HTTP client error occurred while calling the token endpoint: {message}"),
			),
			_ => transient(meta, "HTTP client error occurred while calling the token endpoint"),
		}
	}
}

/// Single-purpose facade over the `oauth2` client for the client credentials grant.
pub(crate) struct CredentialExchange<'a, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: &'a C,
	error_mapper: &'a M,
	strategy: &'a dyn ProviderStrategy,
}
impl<'a, C, M> CredentialExchange<'a, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: &str,
		http_client: &'a C,
		error_mapper: &'a M,
		strategy: &'a dyn ProviderStrategy,
	) -> Result<Self> {
		let token_url = TokenUrl::new(descriptor.token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidTokenEndpoint { source })?;
		// The identity platform expects `client_id` and `client_secret` as form fields.
		let oauth_client = BasicClient::new(OAuthClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.to_owned()))
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self { oauth_client, http_client, error_mapper, strategy })
	}

	/// Exchanges the client secret for a token covering `scope`.
	pub(crate) async fn exchange(
		&self,
		family: TokenFamily,
		scope: &ScopeSet,
	) -> Result<TokenRecord> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let mut request = self.oauth_client.exchange_client_credentials();

		for value in scope.iter() {
			request = request.add_scope(Scope::new(value.to_owned()));
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| self.map_request_error(meta.take(), err))?;

		map_token_response(family, scope.clone(), response)
	}

	fn map_request_error(
		&self,
		meta: Option<ResponseMetadata>,
		err: BasicRequestTokenError<HttpClientError<C::TransportError>>,
	) -> Error {
		let meta = meta.as_ref();

		match err {
			RequestTokenError::ServerResponse(response) =>
				map_server_response_error(self.strategy, response, meta),
			RequestTokenError::Request(error) =>
				self.error_mapper.map_transport_error(meta, error),
			RequestTokenError::Parse(source, _body) =>
				TransientError::TokenResponseParse { source, status: meta_status(meta) }.into(),
			RequestTokenError::Other(message) => transient(meta, message),
		}
	}
}

fn map_token_response(
	family: TokenFamily,
	scope: ScopeSet,
	response: BasicTokenResponse,
) -> Result<TokenRecord> {
	let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

	if expires_in <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn.into());
	}

	// The identity platform normalizes `.default` scopes in its echo, so the requested set is
	// recorded as-is instead of comparing it with `response.scopes()`.
	TokenRecord::builder(family, scope)
		.access_token(response.access_token().secret().to_owned())
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(Duration::seconds(expires_in))
		.build()
		.map_err(|err| match err {
			TokenRecordBuilderError::ExpiryOutOfRange => ConfigError::ExpiresInOutOfRange.into(),
			err => ConfigError::from(err).into(),
		})
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx = ProviderErrorContext::new().with_oauth_error(response.error().as_ref());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let reason = match response.error_description() {
		Some(description) => description.clone(),
		None => response.error().as_ref().to_owned(),
	};

	match strategy.classify_token_error(&ctx) {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason },
		ProviderErrorKind::Transient => transient(meta, reason),
	}
}

fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "request timed out while calling the token endpoint".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::from(err).into()
}

fn transient(meta: Option<&ResponseMetadata>, message: impl Into<String>) -> Error {
	TransientError::TokenEndpoint {
		message: message.into(),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::{
		StandardErrorResponse,
		basic::{BasicErrorResponseType, BasicTokenType},
		AccessToken as OAuthAccessToken, EmptyExtraTokenFields,
	};
	// self
	use super::*;
	use crate::{
		auth::{ClientId, TenantId},
		http::ReqwestHttpClient,
		provider::DefaultProviderStrategy,
	};

	fn family() -> TokenFamily {
		TokenFamily::new(
			TenantId::new("contoso").expect("Tenant fixture should be valid."),
			ClientId::new("dev-app").expect("Client fixture should be valid."),
		)
	}

	fn descriptor() -> ProviderDescriptor {
		ProviderDescriptor::builder()
			.token_endpoint(
				Url::parse("https://login.example.com/contoso/oauth2/v2.0/token")
					.expect("Failed to parse token endpoint URL."),
			)
			.build()
			.expect("Failed to build provider descriptor.")
	}

	fn bearer(access_token: &str) -> BasicTokenResponse {
		BasicTokenResponse::new(
			OAuthAccessToken::new(access_token.into()),
			BasicTokenType::Bearer,
			EmptyExtraTokenFields {},
		)
	}

	#[test]
	fn builds_exchange_from_descriptor() {
		let http_client = ReqwestHttpClient::default();
		let exchange = CredentialExchange::new(
			&descriptor(),
			"dev-app",
			"dev-secret",
			&http_client,
			&ReqwestTransportErrorMapper,
			&DefaultProviderStrategy,
		);

		assert!(exchange.is_ok());
	}

	#[test]
	fn token_response_requires_positive_expiry() {
		let scope =
			ScopeSet::for_resource("https://vault.azure.net").expect("Scope should be valid.");
		let mut response = bearer("eyJ0eXAi");
		let err = map_token_response(family(), scope.clone(), response.clone())
			.expect_err("Missing expires_in must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::MissingExpiresIn)));

		response.set_expires_in(Some(&std::time::Duration::from_secs(3599)));

		let record =
			map_token_response(family(), scope, response).expect("Valid response should map.");

		assert_eq!(record.access_token.expose(), "eyJ0eXAi");
		assert_eq!(record.expires_at - record.issued_at, Duration::seconds(3599));
	}

	#[test]
	fn token_response_with_unrepresentable_expiry_is_an_error() {
		let scope =
			ScopeSet::for_resource("https://vault.azure.net").expect("Scope should be valid.");
		let mut response = bearer("eyJ0eXAi");

		response.set_expires_in(Some(&std::time::Duration::from_secs(999_999_999_999)));

		let err = map_token_response(family(), scope, response)
			.expect_err("Expiry past the calendar must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::ExpiresInOutOfRange)));
	}

	#[test]
	fn server_errors_are_classified_by_strategy() {
		let response = StandardErrorResponse::new(
			BasicErrorResponseType::InvalidClient,
			Some("AADSTS7000215: Invalid client secret provided.".into()),
			None,
		);
		let meta = ResponseMetadata { status: Some(401), retry_after: None };
		let err = map_server_response_error(&DefaultProviderStrategy, response, Some(&meta));

		match err {
			Error::InvalidClient { reason } => assert!(reason.starts_with("AADSTS7000215")),
			other => panic!("Unexpected error variant: {other:?}."),
		}

		let response = StandardErrorResponse::new(
			BasicErrorResponseType::Extension("temporarily_unavailable".into()),
			None,
			None,
		);
		let meta = ResponseMetadata { status: Some(503), retry_after: Some(Duration::seconds(9)) };

		match map_server_response_error(&DefaultProviderStrategy, response, Some(&meta)) {
			Error::Transient(TransientError::TokenEndpoint { status, retry_after, .. }) => {
				assert_eq!(status, Some(503));
				assert_eq!(retry_after, Some(Duration::seconds(9)));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
