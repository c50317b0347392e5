//! Strategy hook that classifies token endpoint failures.
//!
//! The confidential client gathers what it knows about a failed exchange (HTTP status and the
//! OAuth error fields) into a [`ProviderErrorContext`] and lets the strategy decide which
//! error class the caller sees.

// self
use crate::_prelude::*;

/// Strategy that classifies token endpoint errors.
pub trait ProviderStrategy: Send + Sync {
	/// Maps low-level HTTP/JSON errors into the crate taxonomy.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Provider rejected the grant.
	InvalidGrant,
	/// Client authentication failed (bad secret, unknown application or tenant).
	InvalidClient,
	/// Requested scope or resource is not available to the application.
	InsufficientScope,
	/// Failure is temporary; a later poll may succeed.
	Transient,
}

/// Context passed to provider strategies when classifying token errors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field.
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
}
impl ProviderErrorContext {
	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}
}

/// Default strategy for the Microsoft identity platform.
///
/// Looks at `AADSTS` codes in the description first, then the structured OAuth `error` field,
/// keywords in the description, and finally the HTTP status.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if let Some(kind) = ctx.error_description.as_deref().and_then(classify_aadsts) {
			return kind;
		}
		if let Some(kind) = ctx.oauth_error.as_deref().and_then(match_exact_value) {
			return kind;
		}
		if let Some(kind) = ctx.error_description.as_deref().and_then(classify_description) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

// Descriptions look like `AADSTS7000215: Invalid client secret provided. ...`.
fn classify_aadsts(description: &str) -> Option<ProviderErrorKind> {
	let start = description.find("AADSTS")? + "AADSTS".len();
	let code: String =
		description[start..].chars().take_while(char::is_ascii_digit).collect::<String>();

	match code.as_str() {
		// Bad or expired secret, unknown application, unknown tenant.
		"7000215" | "7000222" | "700016" | "90002" | "900023" =>
			Some(ProviderErrorKind::InvalidClient),
		// Unknown resource principal or malformed scope.
		"500011" | "70011" | "1002012" => Some(ProviderErrorKind::InsufficientScope),
		// Throttling and service-side outages.
		"50196" | "90033" | "50089" => Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn match_exact_value(value: &str) -> Option<ProviderErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant") || value.eq_ignore_ascii_case("access_denied") {
		Some(ProviderErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(ProviderErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("invalid_resource")
	{
		Some(ProviderErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(ProviderErrorKind::Transient)
	} else {
		None
	}
}

fn classify_description(description: &str) -> Option<ProviderErrorKind> {
	let lowered = description.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_client") => Some(ProviderErrorKind::InvalidClient),
		text if text.contains("invalid_scope") || text.contains("invalid_resource") =>
			Some(ProviderErrorKind::InsufficientScope),
		text if text.contains("invalid_grant") => Some(ProviderErrorKind::InvalidGrant),
		text if text.contains("temporarily_unavailable") || text.contains("retry") =>
			Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		// `invalid_request` and friends: the request the broker built was rejected.
		Some(400) => ProviderErrorKind::InvalidClient,
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		_ => ProviderErrorKind::Transient,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn classify(ctx: &ProviderErrorContext) -> ProviderErrorKind {
		DefaultProviderStrategy.classify_token_error(ctx)
	}

	#[test]
	fn aadsts_codes_take_precedence() {
		let ctx = ProviderErrorContext::new()
			.with_http_status(401)
			.with_oauth_error("invalid_request")
			.with_error_description(
				"AADSTS500011: The resource principal named https://vault.azure.net was not found.",
			);

		assert_eq!(classify(&ctx), ProviderErrorKind::InsufficientScope);

		let ctx = ProviderErrorContext::new()
			.with_oauth_error("invalid_client")
			.with_error_description("AADSTS7000215: Invalid client secret provided.");

		assert_eq!(classify(&ctx), ProviderErrorKind::InvalidClient);
	}

	#[test]
	fn oauth_fields_then_status() {
		let ctx =
			ProviderErrorContext::new().with_http_status(400).with_oauth_error("invalid_scope");

		assert_eq!(classify(&ctx), ProviderErrorKind::InsufficientScope);

		let ctx = ProviderErrorContext::new().with_http_status(401);

		assert_eq!(classify(&ctx), ProviderErrorKind::InvalidClient);

		let ctx = ProviderErrorContext::new().with_http_status(400);

		assert_eq!(classify(&ctx), ProviderErrorKind::InvalidClient);

		let ctx = ProviderErrorContext::new().with_http_status(503);

		assert_eq!(classify(&ctx), ProviderErrorKind::Transient);
	}

	#[test]
	fn unknown_request_errors_at_400_are_client_errors() {
		let ctx = ProviderErrorContext::new()
			.with_http_status(400)
			.with_oauth_error("invalid_request")
			.with_error_description("AADSTS900144: The request body must contain client_id.");

		assert_eq!(classify(&ctx), ProviderErrorKind::InvalidClient);
	}

	#[test]
	fn description_keywords_apply_when_codes_are_unknown() {
		let ctx = ProviderErrorContext::new()
			.with_http_status(400)
			.with_oauth_error("invalid_request")
			.with_error_description("Service is temporarily_unavailable, retry later.");

		assert_eq!(classify(&ctx), ProviderErrorKind::Transient);
	}
}
