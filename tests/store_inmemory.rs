#![cfg(feature = "test")]

// crates.io
use time::macros;
// self
use msi_broker::{
	_preludet::*,
	auth::{ClientId, ScopeSet, TenantId, TokenFamily, TokenRecord},
	store::{MemoryStore, TokenStore},
};

fn make_family(client: &str) -> TokenFamily {
	let tenant = TenantId::new("contoso").expect("Failed to build tenant identifier.");
	let client = ClientId::new(client).expect("Failed to build client identifier.");

	TokenFamily::new(tenant, client)
}

fn make_scope(resource: &str) -> ScopeSet {
	ScopeSet::for_resource(resource).expect("Failed to build resource scope for tests.")
}

fn build_record_at(
	family: &TokenFamily,
	scope: &ScopeSet,
	access: &str,
	issued: OffsetDateTime,
) -> TokenRecord {
	TokenRecord::builder(family.clone(), scope.clone())
		.access_token(access)
		.issued_at(issued)
		.expires_at(issued + Duration::hours(1))
		.build()
		.expect("Token record fixture should build successfully.")
}

fn build_record(family: &TokenFamily, scope: &ScopeSet, access: &str) -> TokenRecord {
	build_record_at(family, scope, access, macros::datetime!(2025-11-10 12:00 UTC))
}

#[tokio::test]
async fn save_and_fetch_round_trip() {
	let store = MemoryStore::default();
	let family = make_family("dev-app");
	let scope = make_scope("https://management.core.windows.net/");
	let record = build_record(&family, &scope, "access-1");

	store.save(record.clone()).await;

	let fetched =
		store.fetch(&family, &scope).await.expect("Stored record should remain present.");

	assert_eq!(fetched.access_token.expose(), record.access_token.expose());
	assert_eq!(fetched.expires_at, record.expires_at);
	assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn save_replaces_existing_record() {
	let store = MemoryStore::default();
	let family = make_family("dev-app");
	let scope = make_scope("https://vault.azure.net");

	store.save(build_record(&family, &scope, "first")).await;
	store.save(build_record(&family, &scope, "second")).await;

	let fetched =
		store.fetch(&family, &scope).await.expect("Replacement record should be present.");

	assert_eq!(fetched.access_token.expose(), "second");
	assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn records_are_partitioned_by_family_and_scope() {
	let store = MemoryStore::default();
	let family = make_family("dev-app");
	let other_family = make_family("other-app");
	let vault = make_scope("https://vault.azure.net");
	let arm = make_scope("https://management.core.windows.net/");

	store.save(build_record(&family, &vault, "vault-token")).await;

	assert!(store.fetch(&family, &arm).await.is_none());
	assert!(store.fetch(&other_family, &vault).await.is_none());
}

#[tokio::test]
async fn evict_stale_removes_only_the_matching_record() {
	let store = MemoryStore::default();
	let family = make_family("dev-app");
	let vault = make_scope("https://vault.azure.net");
	let arm = make_scope("https://management.core.windows.net/");
	let vault_record = build_record(&family, &vault, "vault-token");

	store.save(vault_record.clone()).await;
	store.save(build_record(&family, &arm, "arm-token")).await;

	assert!(store.evict_stale(&vault_record).await);
	assert!(!store.evict_stale(&vault_record).await, "Nothing is left to evict.");
	assert_eq!(store.len(), 1);
	assert!(!store.is_empty());
}

#[tokio::test]
async fn evict_stale_keeps_a_newer_record() {
	let store = MemoryStore::default();
	let family = make_family("dev-app");
	let scope = make_scope("https://vault.azure.net");
	let issued = macros::datetime!(2025-11-10 12:00 UTC);
	let stale = build_record_at(&family, &scope, "stale", issued);
	let fresh = build_record_at(&family, &scope, "fresh", issued + Duration::minutes(55));

	store.save(stale.clone()).await;
	// A credential exchange replaces the entry between the read and the eviction.
	store.save(fresh).await;

	assert!(!store.evict_stale(&stale).await);

	let kept = store.fetch(&family, &scope).await.expect("Newer record should survive.");

	assert_eq!(kept.access_token.expose(), "fresh");
}

#[tokio::test]
async fn concurrent_saves_keep_one_record_per_key() {
	let store = MemoryStore::default();
	let family = make_family("dev-app");
	let scope = make_scope("https://storage.azure.com/");
	let mut tasks = Vec::new();

	for idx in 0..8 {
		let store = store.clone();
		let record = build_record(&family, &scope, &format!("token-{idx}"));

		tasks.push(tokio::spawn(async move { store.save(record).await }));
	}
	for task in tasks {
		task.await.expect("Save task should not panic.");
	}

	assert_eq!(store.len(), 1);
}
