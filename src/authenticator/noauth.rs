//! Pass-through authenticator for endpoints that need no credentials.

// self
use crate::{
	_prelude::*,
	auth::User,
	authenticator::{Authenticator, AuthenticatorFuture},
	context::Context,
	http::{AuthorizedClient, ReqwestHttpClient},
};

/// Returns the bound base client for every user, including no user at all.
#[derive(Clone, Debug, Default)]
pub struct DefaultAuthenticator {
	http: ReqwestHttpClient,
}
impl DefaultAuthenticator {
	/// Binds the authenticator to `http`.
	pub fn new(http: ReqwestHttpClient) -> Self {
		Self { http }
	}
}
impl Authenticator for DefaultAuthenticator {
	fn authenticated_client<'a>(
		&'a self,
		_: &'a Context,
		_: Option<Arc<dyn User>>,
	) -> AuthenticatorFuture<'a> {
		let client = AuthorizedClient::unauthenticated(self.http.0.clone());

		Box::pin(async move { Ok(client) })
	}
}
