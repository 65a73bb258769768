//! Helpers shared by the integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::MockServer;
use time::{Duration, OffsetDateTime};
// self
use oauth2_requester::{
	auth::{BasicUser, TokenRecord, User},
	authenticator::OAuth2Authenticator,
	oauth::OAuth2Config,
	requester::{Config, Requester},
	store::{MemoryStore, TokenStore},
};

pub const CLIENT_ID: &str = "client-test";
pub const CLIENT_SECRET: &str = "secret-test";

/// Builds a requester with the default ten second timeout.
pub fn requester() -> Requester {
	Requester::new(Config::default()).expect("Failed to build requester for tests.")
}

/// OAuth configuration whose endpoints point at `server`.
pub fn oauth_config(server: &MockServer) -> OAuth2Config {
	OAuth2Config::new(CLIENT_ID, CLIENT_SECRET)
		.with_auth_url(server.url("/authorize"))
		.with_token_url(server.url("/token"))
		.with_redirect_url("http://localhost/callback")
}

/// Authenticator bound to a fresh in-memory store and the requester's HTTP client.
pub fn authenticator(
	requester: &Requester,
	server: &MockServer,
) -> (OAuth2Authenticator, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::default());
	let authenticator = OAuth2Authenticator::new(
		oauth_config(server),
		store.clone() as Arc<dyn TokenStore>,
		requester.http_client().clone(),
	)
	.expect("Failed to build OAuth2 authenticator for tests.");

	(authenticator, store)
}

/// Shared [`BasicUser`] usable wherever an `Arc<dyn User>` is expected.
pub fn user(id: &str, code: &str) -> Arc<dyn User> {
	Arc::new(BasicUser::new(id, code))
}

/// Token record expiring `expires_in` from now.
pub fn record(access: &str, refresh: &str, expires_in: Duration) -> TokenRecord {
	TokenRecord::builder()
		.access_token(access)
		.refresh_token(refresh)
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(expires_in)
		.build()
		.expect("Token record fixture should build.")
}

/// Token endpoint success body in the shape providers return.
pub fn token_body(access: &str, refresh: Option<&str>, expires_in: u64) -> String {
	let mut body = serde_json::json!({
		"access_token": access,
		"token_type": "bearer",
		"scope": "user",
		"expires_in": expires_in,
	});

	if let Some(refresh) = refresh {
		body["refresh_token"] = refresh.into();
	}

	body.to_string()
}
