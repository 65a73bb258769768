//! OAuth 2.0 authenticator backed by a [`TokenStore`].
//!
//! For each call the authenticator validates the user, looks up their stored token, exchanges
//! the user's authorization code only when nothing is stored, and returns a client whose token
//! source refreshes stale tokens and writes every token it yields back to the store.
//!
//! Any stored record, even a stale one, skips the code exchange. Staleness is repaired lazily by
//! the refresh path on first use; a revoked refresh token therefore surfaces as an error on the
//! request rather than triggering a new code exchange.

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, User},
	authenticator::{Authenticator, AuthenticatorFuture},
	context::Context,
	http::{AuthorizedClient, ReqwestHttpClient},
	oauth::{AuthorizationRequest, OAuth2Client, OAuth2Config},
	source::{RefreshingTokenSource, TokenRefreshInterceptor},
	store::TokenStore,
};

/// Authenticator that issues requests with per-user OAuth 2.0 tokens.
///
/// Immutable after construction and safe to share across tasks; all per-user state lives in the
/// bound store.
#[derive(Clone)]
pub struct OAuth2Authenticator {
	config: Arc<OAuth2Config>,
	client: Arc<OAuth2Client>,
	store: Arc<dyn TokenStore>,
	http: ReqwestHttpClient,
}
impl OAuth2Authenticator {
	/// Binds `config` to `store` and the base `http` client.
	///
	/// Fails when the configured endpoints or redirect URI do not parse.
	pub fn new(
		config: OAuth2Config,
		store: Arc<dyn TokenStore>,
		http: ReqwestHttpClient,
	) -> Result<Self> {
		let client = Arc::new(OAuth2Client::new(&config, http.clone())?);

		Ok(Self { config: Arc::new(config), client, store, http })
	}

	/// Client configuration in use.
	pub fn config(&self) -> &OAuth2Config {
		&self.config
	}

	/// Store the authenticator reads from and writes to.
	pub fn store(&self) -> &Arc<dyn TokenStore> {
		&self.store
	}

	/// Starts an authorization-code grant, returning the URL to send the user to.
	pub fn authorization_request(&self) -> Result<AuthorizationRequest> {
		AuthorizationRequest::new(&self.config)
	}

	async fn authorize(&self, ctx: &Context, user: Option<Arc<dyn User>>) -> Result<AuthorizedClient> {
		let user = user.ok_or(Error::MissingUserId)?;

		if user.auth_code().is_empty() {
			return Err(Error::MissingAuthCode);
		}
		if user.user_id().is_empty() {
			return Err(Error::MissingUserId);
		}

		let token = match self.lookup(ctx, user.as_ref()).await? {
			Some(token) => token,
			None => self.exchange(ctx, user.as_ref()).await?,
		};
		let source = RefreshingTokenSource::new(Arc::clone(&self.client), ctx, token);
		let interceptor =
			TokenRefreshInterceptor::new(user, Arc::new(source), Arc::clone(&self.store));

		Ok(AuthorizedClient::with_token_source(self.http.0.clone(), Arc::new(interceptor)))
	}

	async fn lookup(&self, ctx: &Context, user: &dyn User) -> Result<Option<TokenRecord>> {
		ctx.run(async { self.store.get_token(user).await.map_err(Error::from) }).await
	}

	async fn exchange(&self, ctx: &Context, user: &dyn User) -> Result<TokenRecord> {
		let token = self.client.exchange(ctx, user.auth_code()).await?;

		ctx.run(async { self.store.save_token(user, &token).await.map_err(Error::from) }).await?;

		Ok(token)
	}
}
impl Authenticator for OAuth2Authenticator {
	fn authenticated_client<'a>(
		&'a self,
		ctx: &'a Context,
		user: Option<Arc<dyn User>>,
	) -> AuthenticatorFuture<'a> {
		Box::pin(self.authorize(ctx, user))
	}
}
impl Debug for OAuth2Authenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Authenticator").field("config", &self.config).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{
		auth::BasicUser,
		store::{StoreError, StoreFuture},
	};

	#[derive(Default)]
	struct CountingStore {
		gets: AtomicUsize,
		saves: AtomicUsize,
	}
	impl TokenStore for CountingStore {
		fn get_token<'a>(&'a self, _: &'a dyn User) -> StoreFuture<'a, Option<TokenRecord>> {
			self.gets.fetch_add(1, Ordering::SeqCst);

			Box::pin(async { Ok(None) })
		}

		fn save_token<'a>(&'a self, _: &'a dyn User, _: &'a TokenRecord) -> StoreFuture<'a, ()> {
			self.saves.fetch_add(1, Ordering::SeqCst);

			Box::pin(async { Ok(()) })
		}
	}

	struct UnreachableStore;
	impl TokenStore for UnreachableStore {
		fn get_token<'a>(&'a self, _: &'a dyn User) -> StoreFuture<'a, Option<TokenRecord>> {
			Box::pin(async { Err(StoreError::Backend { message: "connection refused".into() }) })
		}

		fn save_token<'a>(&'a self, _: &'a dyn User, _: &'a TokenRecord) -> StoreFuture<'a, ()> {
			Box::pin(async { Ok(()) })
		}
	}

	fn config() -> OAuth2Config {
		// Port 9 (discard) is never contacted by these tests.
		OAuth2Config::new("client", "secret")
			.with_auth_url("http://127.0.0.1:9/authorize")
			.with_token_url("http://127.0.0.1:9/token")
	}

	#[tokio::test]
	async fn identity_checks_run_before_any_store_access() {
		let store = Arc::new(CountingStore::default());
		let authenticator =
			OAuth2Authenticator::new(config(), store.clone(), ReqwestHttpClient::default())
				.expect("Authenticator should build.");
		let ctx = Context::new();
		let cases: [(Option<Arc<dyn User>>, fn(&Error) -> bool); 4] = [
			(None, |e| matches!(e, Error::MissingUserId)),
			(Some(Arc::new(BasicUser::new("user", ""))), |e| matches!(e, Error::MissingAuthCode)),
			(Some(Arc::new(BasicUser::new("", "code"))), |e| matches!(e, Error::MissingUserId)),
			// The authorization code is checked first.
			(Some(Arc::new(BasicUser::new("", ""))), |e| matches!(e, Error::MissingAuthCode)),
		];

		for (user, expected) in cases {
			let err = authenticator
				.authenticated_client(&ctx, user)
				.await
				.expect_err("Incomplete identities must be rejected.");

			assert!(expected(&err), "unexpected error: {err:?}");
		}

		assert_eq!(store.gets.load(Ordering::SeqCst), 0);
		assert_eq!(store.saves.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn store_failures_surface_verbatim() {
		let authenticator = OAuth2Authenticator::new(
			config(),
			Arc::new(UnreachableStore),
			ReqwestHttpClient::default(),
		)
		.expect("Authenticator should build.");
		let err = authenticator
			.authenticated_client(&Context::new(), Some(Arc::new(BasicUser::new("user", "code"))))
			.await
			.expect_err("Lookup failures must propagate.");

		assert!(matches!(err, Error::Storage(StoreError::Backend { .. })));
	}

	#[test]
	fn authorization_request_uses_configured_endpoint() {
		let authenticator = OAuth2Authenticator::new(
			config().with_scopes(["user"]),
			Arc::new(CountingStore::default()),
			ReqwestHttpClient::default(),
		)
		.expect("Authenticator should build.");
		let request =
			authenticator.authorization_request().expect("Authorization URL should build.");

		assert_eq!(request.url.path(), "/authorize");
		assert!(request.url.as_str().contains("scope=user"));
	}
}
