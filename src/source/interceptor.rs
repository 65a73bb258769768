//! Write-through decorator that persists every token a source yields.

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, User},
	source::{TokenFuture, TokenSource},
	store::TokenStore,
};

/// Wraps a [`TokenSource`] so each token it produces is saved for `user` before it is used.
///
/// Saving on every call (rather than only after a refresh) keeps the store authoritative even
/// when the inner source renews tokens internally. A failed save fails the token request, so
/// the caller never sends a credential the store does not know about.
pub struct TokenRefreshInterceptor {
	user: Arc<dyn User>,
	source: Arc<dyn TokenSource>,
	store: Arc<dyn TokenStore>,
}
impl TokenRefreshInterceptor {
	/// Decorates `source`, persisting into `store` under `user`'s identifier.
	pub fn new(user: Arc<dyn User>, source: Arc<dyn TokenSource>, store: Arc<dyn TokenStore>) -> Self {
		Self { user, source, store }
	}

	async fn intercept(&self) -> Result<TokenRecord> {
		let token = self.source.token().await?;

		self.store.save_token(self.user.as_ref(), &token).await?;

		Ok(token)
	}
}
impl TokenSource for TokenRefreshInterceptor {
	fn token(&self) -> TokenFuture<'_> {
		Box::pin(self.intercept())
	}
}
impl Debug for TokenRefreshInterceptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRefreshInterceptor")
			.field("user_id", &self.user.user_id())
			.finish_non_exhaustive()
	}
}
