//! Issues a request as a user whose token is persisted in a file store.
//!
//! The first run exchanges `DEMO_AUTH_CODE` for a token pair; later runs reuse (and refresh) the
//! stored record. Point `DEMO_PROVIDER` and `DEMO_API` at a real provider to try it.

// std
use std::{env, sync::Arc, time::Duration};
// crates.io
use color_eyre::Result;
use serde_json::Value;
// self
use oauth2_requester::{
	auth::{BasicUser, User},
	authenticator::OAuth2Authenticator,
	context::Context,
	oauth::OAuth2Config,
	requester::{Config, Requester},
	store::{FileStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let provider =
		env::var("DEMO_PROVIDER").unwrap_or_else(|_| "https://provider.example.com".into());
	let api = env::var("DEMO_API").unwrap_or_else(|_| "https://api.example.com/me".into());
	let code = env::var("DEMO_AUTH_CODE").unwrap_or_else(|_| "demo-code".into());
	let requester = Requester::new(Config { timeout: 15 })?;
	let store: Arc<dyn TokenStore> =
		Arc::new(FileStore::open(env::temp_dir().join("oauth2_requester_demo.json"))?);
	let config = OAuth2Config::new("demo-client", "demo-secret")
		.with_auth_url(format!("{provider}/authorize"))
		.with_token_url(format!("{provider}/token"))
		.with_redirect_url("https://app.example.com/oauth/callback");
	let authenticator = OAuth2Authenticator::new(config, store, requester.http_client().clone())?;
	let user: Arc<dyn User> = Arc::new(BasicUser::new("demo-user", code));
	let ctx = Context::new().with_timeout(Duration::from_secs(30));
	let request = requester.http_client().get(api).build()?;
	let mut profile = Value::Null;

	requester.do_request(&ctx, request, Some(&mut profile), Some(user), Some(&authenticator)).await?;

	println!("{profile:#}");

	Ok(())
}
