//! Request validation: caller authentication first, then the query, then scope derivation.

// crates.io
use axum::http::HeaderMap;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, ScopeValidationError},
	secret::SharedSecret,
};

/// Header carrying the caller's copy of the shared secret. Header names are case-insensitive.
pub const SECRET_HEADER: &str = "secret";
/// Query parameter naming the API version; any non-empty value is accepted.
pub const API_VERSION_PARAM: &str = "api-version";
/// Query parameter naming the target resource.
pub const RESOURCE_PARAM: &str = "resource";

/// Reasons a request is refused before any token is acquired.
///
/// Each message starts with the variant name; callers match on that prefix.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RequestError {
	/// No `secret` header, or an empty one.
	#[error("MissingSecret: the `secret` header is required.")]
	MissingSecret,
	/// The `secret` header does not match this process's secret.
	#[error("InvalidSecret: the `secret` header does not match.")]
	InvalidSecret,
	/// No `api-version` query parameter.
	#[error("MissingApiVersion: the `api-version` query parameter is required.")]
	MissingApiVersion,
	/// No `resource` query parameter.
	#[error("MissingResource: the `resource` query parameter is required.")]
	MissingResource,
	/// The resource cannot be turned into a scope.
	#[error("InvalidResource: `{resource}` is not a valid resource identifier.")]
	InvalidResource {
		/// Resource value as received.
		resource: String,
		/// Scope validation failure.
		#[source]
		source: ScopeValidationError,
	},
}

/// Validated request: the scope set to acquire a token for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthRequest {
	/// Exactly one `.default` scope derived from the requested resource.
	pub scope: ScopeSet,
}

/// Validates one inbound request.
///
/// Checks run in a fixed order and the first failure wins: secret presence, secret match,
/// `api-version`, `resource`. Nothing about the query is looked at until the secret matched.
pub fn validate_request(
	headers: &HeaderMap,
	query: Option<&str>,
	secret: &SharedSecret,
) -> Result<AuthRequest, RequestError> {
	let presented = headers.get(SECRET_HEADER).ok_or(RequestError::MissingSecret)?;

	if presented.is_empty() {
		return Err(RequestError::MissingSecret);
	}

	// Non-ASCII bytes can never equal the URL-safe secret.
	let presented = presented.to_str().map_err(|_| RequestError::InvalidSecret)?;

	if !secret.verify(presented) {
		return Err(RequestError::InvalidSecret);
	}

	let query = query.unwrap_or_default();

	query_param(query, API_VERSION_PARAM).ok_or(RequestError::MissingApiVersion)?;

	let resource = query_param(query, RESOURCE_PARAM).ok_or(RequestError::MissingResource)?;
	let scope = ScopeSet::for_resource(&resource)
		.map_err(|source| RequestError::InvalidResource { resource, source })?;

	Ok(AuthRequest { scope })
}

// First occurrence wins; an empty value counts as absent.
fn query_param(query: &str, name: &str) -> Option<String> {
	form_urlencoded::parse(query.as_bytes())
		.find(|(key, _)| key == name)
		.map(|(_, value)| value.into_owned())
		.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::http::{HeaderName, HeaderValue};
	use rand::{SeedableRng, rngs::StdRng};
	// self
	use super::*;

	fn secret() -> SharedSecret {
		SharedSecret::generate(&mut StdRng::seed_from_u64(7))
	}

	fn headers(value: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(
			HeaderName::from_bytes(b"Secret").expect("Header name should be valid."),
			HeaderValue::from_str(value).expect("Header value should be valid."),
		);

		headers
	}

	const QUERY: &str =
		"api-version=2019-08-01&resource=https%3A%2F%2Fmanagement.core.windows.net%2F";

	#[test]
	fn valid_requests_derive_one_default_scope() {
		let secret = secret();
		let request = validate_request(&headers(secret.expose()), Some(QUERY), &secret)
			.expect("Request should validate.");

		assert_eq!(request.scope.normalized(), "https://management.core.windows.net/.default");
		assert_eq!(request.scope.len(), 1);

		let request = validate_request(
			&headers(secret.expose()),
			Some("resource=https://vault.azure.net&api-version=1"),
			&secret,
		)
		.expect("Request should validate.");

		assert_eq!(request.scope.normalized(), "https://vault.azure.net/.default");
	}

	#[test]
	fn secret_is_checked_before_the_query() {
		let secret = secret();
		let check = |headers: &HeaderMap, query| validate_request(headers, query, &secret);

		assert_eq!(check(&HeaderMap::new(), None), Err(RequestError::MissingSecret));
		assert_eq!(check(&headers(""), Some(QUERY)), Err(RequestError::MissingSecret));
		assert_eq!(check(&headers("nope"), None), Err(RequestError::InvalidSecret));
	}

	#[test]
	fn secret_match_is_exact() {
		let secret = secret();
		let upper = secret.expose().to_ascii_uppercase();
		let padded = format!(" {}", secret.expose());

		assert_eq!(
			validate_request(&headers(&upper), Some(QUERY), &secret),
			Err(RequestError::InvalidSecret)
		);
		assert_eq!(
			validate_request(&headers(&padded), Some(QUERY), &secret),
			Err(RequestError::InvalidSecret)
		);
	}

	#[test]
	fn query_checks_run_in_order() {
		let secret = secret();
		let valid = headers(secret.expose());

		assert_eq!(validate_request(&valid, None, &secret), Err(RequestError::MissingApiVersion));
		assert_eq!(
			validate_request(&valid, Some("resource=https://vault.azure.net"), &secret),
			Err(RequestError::MissingApiVersion)
		);
		assert_eq!(
			validate_request(&valid, Some("api-version=2019-08-01"), &secret),
			Err(RequestError::MissingResource)
		);
		assert_eq!(
			validate_request(&valid, Some("api-version=&resource=x"), &secret),
			Err(RequestError::MissingApiVersion)
		);
		assert!(matches!(
			validate_request(&valid, Some("api-version=1&resource=has%20space"), &secret),
			Err(RequestError::InvalidResource { .. })
		));
	}

	#[test]
	fn first_repeated_parameter_wins() {
		let secret = secret();
		let request = validate_request(
			&headers(secret.expose()),
			Some("api-version=1&resource=https://a.example/&resource=https://b.example/"),
			&secret,
		)
		.expect("Request should validate.");

		assert_eq!(request.scope.normalized(), "https://a.example/.default");
	}

	#[test]
	fn messages_lead_with_the_reason() {
		assert!(RequestError::MissingSecret.to_string().starts_with("MissingSecret"));
		assert!(RequestError::InvalidSecret.to_string().starts_with("InvalidSecret"));
		assert!(RequestError::MissingApiVersion.to_string().starts_with("MissingApiVersion"));
		assert!(RequestError::MissingResource.to_string().starts_with("MissingResource"));
	}
}
