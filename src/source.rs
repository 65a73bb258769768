//! Token sources resolve the credential attached to each outbound request.
//!
//! [`RefreshingTokenSource`] owns a user's current token and renews it through the token
//! endpoint when it goes stale. [`TokenRefreshInterceptor`] decorates any source so that every
//! token it yields is written back to the [`TokenStore`](crate::store::TokenStore) before use.

pub mod interceptor;
pub mod refresh;

pub use interceptor::TokenRefreshInterceptor;
pub use refresh::RefreshingTokenSource;

// self
use crate::{_prelude::*, auth::TokenRecord};

/// Boxed future returned by [`TokenSource::token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenRecord>> + 'a + Send>>;

/// Produces a currently-valid token, renewing it if necessary.
pub trait TokenSource
where
	Self: Send + Sync,
{
	/// Returns the token to attach to the next request.
	fn token(&self) -> TokenFuture<'_>;
}
