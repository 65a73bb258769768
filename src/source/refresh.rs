//! Token source that renews stale tokens with the `refresh_token` grant.

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	context::Context,
	error::ConfigError,
	oauth::OAuth2Client,
	source::{TokenFuture, TokenSource},
};

/// Holds one user's current token and refreshes it through the token endpoint once it is
/// within [`EXPIRY_SKEW`](crate::auth::EXPIRY_SKEW) of expiring.
///
/// Concurrent callers share a single lock, so at most one refresh is in flight per source and
/// the others observe its result.
pub struct RefreshingTokenSource {
	client: Arc<OAuth2Client>,
	ctx: Context,
	current: AsyncMutex<TokenRecord>,
}
impl RefreshingTokenSource {
	/// Creates a source seeded with `token`.
	///
	/// Refreshes run under `ctx`'s cancellation; its deadline is not kept because the source
	/// outlives the call that created it.
	pub fn new(client: Arc<OAuth2Client>, ctx: &Context, token: TokenRecord) -> Self {
		Self {
			client,
			ctx: Context::with_cancellation(ctx.cancellation_token().clone()),
			current: AsyncMutex::new(token),
		}
	}

	/// Returns a copy of the token currently held, without refreshing it.
	pub async fn current(&self) -> TokenRecord {
		self.current.lock().await.clone()
	}

	async fn resolve(&self) -> Result<TokenRecord> {
		let mut current = self.current.lock().await;

		if current.is_valid() {
			return Ok(current.clone());
		}

		let refresh_token = current
			.refresh_token
			.as_ref()
			.filter(|secret| !secret.is_empty())
			.map(|secret| secret.expose().to_owned())
			.ok_or(ConfigError::MissingRefreshToken)?;
		let mut renewed = self.client.refresh(&self.ctx, &refresh_token).await?;

		// Providers may omit the refresh token on renewal; the previous one stays usable.
		if !renewed.is_refreshable() {
			renewed.refresh_token = current.refresh_token.clone();
		}

		*current = renewed.clone();

		Ok(renewed)
	}
}
impl TokenSource for RefreshingTokenSource {
	fn token(&self) -> TokenFuture<'_> {
		Box::pin(self.resolve())
	}
}
impl Debug for RefreshingTokenSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshingTokenSource").field("client", &self.client).finish_non_exhaustive()
	}
}
