#![cfg(feature = "test")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use msi_broker::{
	_preludet::*,
	auth::{ScopeSet, TokenRecord},
	broker::TokenSource,
	store::{MemoryStore, TokenStore},
};

const TENANT: &str = "contoso";
const CLIENT_ID: &str = "11111111-2222-3333-4444-555555555555";
const CLIENT_SECRET: &str = "dev-secret";
const TOKEN_PATH: &str = "/contoso/oauth2/v2.0/token";

fn build_client(server: &MockServer) -> (ReqwestTestClient, Arc<MemoryStore>) {
	build_reqwest_test_client(
		test_descriptor(&server.url(TOKEN_PATH)),
		TENANT,
		CLIENT_ID,
		CLIENT_SECRET,
	)
}

fn scope(resource: &str) -> ScopeSet {
	ScopeSet::for_resource(resource).expect("Resource scope should be valid.")
}

#[tokio::test]
async fn exchange_posts_the_default_scope_and_caches_the_token() {
	let server = MockServer::start_async().await;
	let (client, store) = build_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.form_urlencoded_tuple("grant_type", "client_credentials")
				.form_urlencoded_tuple("scope", "https://management.core.windows.net/.default")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET);
			then.status(200).header("content-type", "application/json").body(
				json!({
					"token_type": "Bearer",
					"expires_in": 3599,
					"ext_expires_in": 3599,
					"access_token": "eyJ0eXAi",
				})
				.to_string(),
			);
		})
		.await;
	let scope = scope("https://management.core.windows.net/");
	let record = client.client_credentials(&scope).await.expect("Exchange should succeed.");

	assert_eq!(record.access_token.expose(), "eyJ0eXAi");
	assert_eq!(record.expires_at - record.issued_at, Duration::seconds(3599));

	mock.assert_async().await;

	let stored =
		store.fetch(&record.family, &scope).await.expect("Exchanged record should be cached.");

	assert_eq!(stored.access_token.expose(), "eyJ0eXAi");
}

#[tokio::test]
async fn silent_misses_until_an_exchange_fills_the_cache() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				json!({ "token_type": "Bearer", "expires_in": 3599, "access_token": "vault-token" })
					.to_string(),
			);
		})
		.await;
	let scope = scope("https://vault.azure.net");

	assert!(matches!(client.acquire_silent(&scope).await, Err(Error::CacheMiss { .. })));

	mock.assert_calls_async(0).await;

	let issued = client
		.acquire_token_by_credential(&scope)
		.await
		.expect("Credential acquisition should succeed.");
	let cached = client.acquire_token_silent(&scope).await.expect("Silent acquisition should hit.");

	assert_eq!(cached, issued);
	assert_eq!(cached.access_token.expose(), "vault-token");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_exchanges_for_one_scope_are_coalesced() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				json!({ "token_type": "Bearer", "expires_in": 900, "access_token": "guard-token" })
					.to_string(),
			);
		})
		.await;
	let scope = scope("https://storage.azure.com/");
	let (first, second): (Result<TokenRecord>, Result<TokenRecord>) =
		tokio::join!(client.client_credentials(&scope), client.client_credentials(&scope));

	assert_eq!(first.expect("First call should succeed.").access_token.expose(), "guard-token");
	assert_eq!(second.expect("Second call should succeed.").access_token.expose(), "guard-token");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn sequential_exchanges_always_reach_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				json!({ "token_type": "Bearer", "expires_in": 900, "access_token": "fresh" })
					.to_string(),
			);
		})
		.await;
	let scope = scope("https://graph.microsoft.com");

	client.client_credentials(&scope).await.expect("First exchange should succeed.");
	client.client_credentials(&scope).await.expect("Second exchange should succeed.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn invalid_client_secret_is_classified() {
	let server = MockServer::start_async().await;
	let (client, store) = build_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(401).header("content-type", "application/json").body(
				json!({
					"error": "invalid_client",
					"error_description": "AADSTS7000215: Invalid client secret provided.",
					"error_codes": [7000215],
				})
				.to_string(),
			);
		})
		.await;
	let err = client
		.client_credentials(&scope("https://vault.azure.net"))
		.await
		.expect_err("Invalid client secrets should surface to the caller.");

	match err {
		Error::InvalidClient { reason } => assert!(reason.starts_with("AADSTS7000215")),
		other => panic!("Unexpected error variant: {other:?}."),
	}

	mock.assert_async().await;

	assert!(store.is_empty());
}

#[tokio::test]
async fn unknown_resource_is_an_insufficient_scope() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400).header("content-type", "application/json").body(
				json!({
					"error": "invalid_resource",
					"error_description": "AADSTS500011: The resource principal named \
						https://nope.example was not found in the tenant named contoso.",
				})
				.to_string(),
			);
		})
		.await;
	let err = client
		.client_credentials(&scope("https://nope.example"))
		.await
		.expect_err("Unknown resources should surface to the caller.");

	assert!(matches!(err, Error::InsufficientScope { .. }));

	mock.assert_async().await;
}
