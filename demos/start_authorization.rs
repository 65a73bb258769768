//! Starts an authorization-code grant and validates the `state` handed back on the redirect.

// std
use std::{collections::HashMap, sync::Arc};
// crates.io
use color_eyre::Result;
// self
use oauth2_requester::{
	authenticator::OAuth2Authenticator,
	oauth::{ClientAuthMethod, OAuth2Config},
	requester::{Config, Requester},
	store::{MemoryStore, TokenStore},
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let requester = Requester::new(Config::default())?;
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let config = OAuth2Config::new("demo-client", "demo-secret")
		.with_auth_url("https://provider.example.com/authorize")
		.with_token_url("https://provider.example.com/token")
		.with_redirect_url("https://app.example.com/oauth/callback")
		.with_scopes(["user"])
		.with_client_auth_method(ClientAuthMethod::ClientSecretPost);
	let authenticator = OAuth2Authenticator::new(config, store, requester.http_client().clone())?;
	let request = authenticator.authorization_request()?;

	println!("Send your user to {}.", request.url);

	let mut pending: HashMap<String, _> = HashMap::new();

	pending.insert(request.state.clone(), request.clone());

	// Simulate the redirect handler looking up the pending request by `state`.
	let returned_state = request.state.clone();

	if let Some(stashed) = pending.remove(&returned_state) {
		stashed.validate_state(&returned_state)?;
		println!("State validated; hand the returned `code` to the user's `auth_code`.");
	} else {
		eprintln!("State `{returned_state}` was not recognized.");
	}

	Ok(())
}
