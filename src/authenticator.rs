//! Authenticators turn an optional user into an HTTP client ready to issue requests on that
//! user's behalf.
//!
//! Two schemes ship with the crate: [`DefaultAuthenticator`] hands out the base client
//! untouched, and [`OAuth2Authenticator`] resolves (or exchanges) the user's OAuth 2.0 token and
//! returns a client that keeps it fresh and persisted. New schemes plug in by implementing
//! [`Authenticator`]; the [`Requester`](crate::requester::Requester) only depends on the trait.

pub mod noauth;
pub mod oauth2;

pub use self::{noauth::DefaultAuthenticator, oauth2::OAuth2Authenticator};

// self
use crate::{_prelude::*, auth::User, context::Context, http::AuthorizedClient};

/// Boxed future returned by [`Authenticator::authenticated_client`].
pub type AuthenticatorFuture<'a> =
	Pin<Box<dyn Future<Output = Result<AuthorizedClient>> + 'a + Send>>;

/// Produces an HTTP client authorized for `user`.
pub trait Authenticator
where
	Self: Send + Sync,
{
	/// Returns a client whose requests are authorized for `user`.
	///
	/// `user` is optional because some schemes need no identity at all; schemes that do must
	/// fail with [`Error::MissingUserId`] when it is absent.
	fn authenticated_client<'a>(
		&'a self,
		ctx: &'a Context,
		user: Option<Arc<dyn User>>,
	) -> AuthenticatorFuture<'a>;
}
